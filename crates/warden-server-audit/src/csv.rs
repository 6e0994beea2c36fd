// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! RFC 4180 CSV rendering of audit entries.

use serde::{Deserialize, Serialize};

use crate::entry::AuditLogEntry;

pub const CSV_HEADER: &str =
	"id,ts,actorId,actorName,ip,action,resource,resourceId,status,requestId,meta";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvExport {
	pub csv: String,
	pub rows: usize,
	/// More entries matched than were written.
	pub truncated: bool,
}

/// Renders at most `max_rows` of `entries`, in the order given.
pub fn export_csv<'a, I>(entries: I, max_rows: usize) -> CsvExport
where
	I: IntoIterator<Item = &'a AuditLogEntry>,
{
	let mut csv = String::from(CSV_HEADER);
	csv.push_str("\r\n");

	let mut rows = 0;
	let mut truncated = false;
	for entry in entries {
		if rows == max_rows {
			truncated = true;
			break;
		}
		push_row(&mut csv, entry);
		rows += 1;
	}

	CsvExport {
		csv,
		rows,
		truncated,
	}
}

fn push_row(out: &mut String, entry: &AuditLogEntry) {
	let meta = serde_json::to_string(&entry.meta).unwrap_or_else(|_| "{}".to_string());
	let cells = [
		entry.id.as_str(),
		entry.ts.as_str(),
		entry.actor_id.as_str(),
		entry.actor_name.as_deref().unwrap_or(""),
		entry.ip.as_str(),
		entry.action.as_str(),
		entry.resource.as_str(),
		entry.resource_id.as_deref().unwrap_or(""),
		entry.status.as_str(),
		entry.request_id.as_deref().unwrap_or(""),
		meta.as_str(),
	];

	for (i, cell) in cells.iter().enumerate() {
		if i > 0 {
			out.push(',');
		}
		out.push_str(&escape_cell(cell));
	}
	out.push_str("\r\n");
}

/// Neutralizes spreadsheet formulas, then applies RFC 4180 quoting.
pub fn escape_cell(value: &str) -> String {
	let guarded = if value.starts_with(['=', '+', '-', '@']) {
		format!("'{value}")
	} else {
		value.to_string()
	};

	if guarded.contains([',', '"', '\r', '\n']) {
		format!("\"{}\"", guarded.replace('"', "\"\""))
	} else {
		guarded
	}
}
