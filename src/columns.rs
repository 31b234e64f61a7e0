//! Header sanitization and the raw/output column mapping.
//!
//! Two header sequences exist for every run:
//!
//! - **raw headers**: one per source column, in source order.
//! - **file headers**: what the output carries. Equal to the raw headers unless
//!   id generation is on, in which case a synthetic `id` leads and any source
//!   `id` column is dropped.
//!
//! [`HeaderLayout`] owns both and answers every "which output slot does raw
//! column N land in" question, so nothing else does index arithmetic.

use std::collections::HashSet;

use uuid::Uuid;

use crate::transform::{
    phone,
    string_ops::{self, CaseRule},
};

pub const ID_COLUMN: &str = "id";
const BOM: char = '\u{feff}';

/// Normalizes arbitrary header text into a lowercase `[a-z0-9_]` identifier.
pub fn sanitize_column_name(raw: &str) -> String {
    let trimmed = raw.trim_start_matches(BOM).trim();
    let mut out = String::with_capacity(trimmed.len());
    for ch in trimmed.chars() {
        let mapped = if ch.is_ascii_alphanumeric() || ch == '_' {
            ch.to_ascii_lowercase()
        } else {
            '_'
        };
        if mapped == '_' && out.ends_with('_') {
            continue;
        }
        out.push(mapped);
    }
    let collapsed = out.trim_matches('_');
    if collapsed.is_empty() {
        placeholder_name()
    } else {
        collapsed.to_string()
    }
}

/// Light cleanup used when headers keep their original spelling.
pub fn tidy_column_name(raw: &str) -> String {
    let trimmed = raw.trim_start_matches(BOM).trim();
    if trimmed.is_empty() {
        placeholder_name()
    } else {
        trimmed.to_string()
    }
}

fn placeholder_name() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("col_{}", &suffix[..5])
}

/// Appends `_1`, `_2`, ... to repeated names in first-seen order.
///
/// Comparison ignores ASCII case so `ID` and `id` never both survive.
pub fn dedupe_headers(names: Vec<String>) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::with_capacity(names.len());
    let mut result = Vec::with_capacity(names.len());
    for name in names {
        let mut candidate = name.clone();
        let mut suffix = 0usize;
        while used.contains(&candidate.to_ascii_lowercase()) {
            suffix += 1;
            candidate = format!("{name}_{suffix}");
        }
        used.insert(candidate.to_ascii_lowercase());
        result.push(candidate);
    }
    result
}

/// Per raw column gating decided once from its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnProfile {
    pub source_id: bool,
    pub phone: bool,
    pub case: CaseRule,
}

#[derive(Debug, Clone)]
pub struct HeaderLayout {
    raw: Vec<String>,
    file: Vec<String>,
    source_id: Option<usize>,
    output_slots: Vec<Option<usize>>,
    generate_id: bool,
}

impl HeaderLayout {
    pub fn new(raw: Vec<String>, generate_id: bool) -> Self {
        let source_id = raw
            .iter()
            .position(|name| name.trim().eq_ignore_ascii_case(ID_COLUMN));
        let mut file = Vec::with_capacity(raw.len() + 1);
        let mut output_slots = Vec::with_capacity(raw.len());
        if generate_id {
            file.push(ID_COLUMN.to_string());
        }
        for (idx, name) in raw.iter().enumerate() {
            if generate_id && source_id == Some(idx) {
                output_slots.push(None);
                continue;
            }
            output_slots.push(Some(file.len()));
            file.push(name.clone());
        }
        Self {
            raw,
            file,
            source_id,
            output_slots,
            generate_id,
        }
    }

    pub fn raw(&self) -> &[String] {
        &self.raw
    }

    pub fn file(&self) -> &[String] {
        &self.file
    }

    pub fn source_id(&self) -> Option<usize> {
        self.source_id
    }

    pub fn generates_id(&self) -> bool {
        self.generate_id
    }

    /// Output position of raw column `raw_idx`, or `None` when it is dropped.
    pub fn output_index(&self, raw_idx: usize) -> Option<usize> {
        self.output_slots.get(raw_idx).copied().flatten()
    }

    pub fn is_source_id(&self, raw_idx: usize) -> bool {
        self.source_id == Some(raw_idx)
    }

    /// Raw indices that carry data, i.e. everything except a source id.
    pub fn data_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.raw.len()).filter(|idx| !self.is_source_id(*idx))
    }

    pub fn profiles(&self) -> Vec<ColumnProfile> {
        self.raw
            .iter()
            .enumerate()
            .map(|(idx, name)| ColumnProfile {
                source_id: self.is_source_id(idx),
                phone: phone::is_phone_column(name),
                case: string_ops::case_rule_for(name),
            })
            .collect()
    }

    /// Builds an output row from a raw row. `id` is used only when the layout
    /// generates identifiers.
    pub fn assemble(&self, raw_row: &[String], id: u64) -> Vec<String> {
        if !self.generate_id {
            let mut row = raw_row.to_vec();
            row.resize(self.file.len(), String::new());
            return row;
        }
        let mut row = vec![String::new(); self.file.len()];
        if let Some(slot) = row.first_mut() {
            *slot = id.to_string();
        }
        for (raw_idx, value) in raw_row.iter().enumerate() {
            if let Some(out_idx) = self.output_index(raw_idx)
                && let Some(slot) = row.get_mut(out_idx)
            {
                slot.clone_from(value);
            }
        }
        row
    }
}
