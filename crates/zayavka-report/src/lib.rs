// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! XLSX export of ticket data.
//!
//! One worksheet per export: a dark-green header row, rows tinted by
//! status (open light red, closed light green), a frozen header with an
//! autofilter, and auto-sized columns with a fixed wide description
//! column. Filenames carry a hash of the filter, timestamp, and a random
//! component so concurrent exports never collide.

use std::path::{Path, PathBuf};

use rand::distributions::Alphanumeric;
use rand::Rng;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};
use sha2::{Digest, Sha256};
use strum::{Display, EnumString};
use tracing::info;
use zayavka_core::hours::local_now;
use zayavka_core::{ReportRow, ZayavkaError};

const HEADER_BG: Color = Color::RGB(0x4F7942);
const CLOSED_BG: Color = Color::RGB(0xA5D6A7);
const OPEN_BG: Color = Color::RGB(0xFFCCBC);

const HEADERS: [&str; 10] = [
    "№",
    "ФИО",
    "Телефон",
    "Email",
    "Категория",
    "Адрес",
    "Описание",
    "Статус",
    "Создана",
    "Исполнитель",
];

const DESCRIPTION_COL: u16 = 6;
const DESCRIPTION_WIDTH: f64 = 50.0;

/// Which tickets an export covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum ReportFilter {
    /// Tickets created today at or after 08:00 local time.
    #[strum(serialize = "today")]
    Today,
    /// Every ticket on record.
    #[strum(serialize = "all_time")]
    AllTime,
}

impl ReportFilter {
    /// Lower bound for `created_at`, in the local-offset timestamp format
    /// the repository stores, or `None` for an unbounded export.
    pub fn since(&self) -> Option<String> {
        match self {
            ReportFilter::Today => {
                Some(format!("{} 08:00:00", local_now().format("%Y-%m-%d")))
            }
            ReportFilter::AllTime => None,
        }
    }
}

/// Write `rows` as an XLSX file under `output_dir`. Returns the path of
/// the written file.
pub fn write_report(
    rows: &[ReportRow],
    filter: ReportFilter,
    output_dir: &Path,
) -> Result<PathBuf, ZayavkaError> {
    std::fs::create_dir_all(output_dir)
        .map_err(|e| ZayavkaError::Internal(format!("reports dir: {e}")))?;
    let path = output_dir.join(report_filename(filter));

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(HEADER_BG)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin);
    let row_format = |bg: Color| {
        Format::new()
            .set_background_color(bg)
            .set_align(FormatAlign::Left)
            .set_align(FormatAlign::Top)
            .set_text_wrap()
            .set_border(FormatBorder::Thin)
    };
    let closed_format = row_format(CLOSED_BG);
    let open_format = row_format(OPEN_BG);

    for (col, header) in HEADERS.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(xlsx_err)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let format = if row.status == "closed" {
            &closed_format
        } else {
            &open_format
        };
        let r = (i + 1) as u32;
        sheet
            .write_number_with_format(r, 0, row.id as f64, format)
            .map_err(xlsx_err)?;
        let cells = [
            row.full_name.as_str(),
            row.phone.as_deref().unwrap_or(""),
            row.email.as_deref().unwrap_or(""),
            row.category.as_str(),
            row.address.as_str(),
            row.description.as_str(),
            row.status.as_str(),
            row.created_at.as_str(),
            row.assignee_name.as_deref().unwrap_or(""),
        ];
        for (offset, cell) in cells.iter().enumerate() {
            sheet
                .write_string_with_format(r, (offset + 1) as u16, *cell, format)
                .map_err(xlsx_err)?;
        }
    }

    for col in 0..HEADERS.len() as u16 {
        let width = if col == DESCRIPTION_COL {
            DESCRIPTION_WIDTH
        } else {
            column_width(rows, col)
        };
        sheet.set_column_width(col, width).map_err(xlsx_err)?;
    }
    sheet
        .autofilter(0, 0, rows.len() as u32, (HEADERS.len() - 1) as u16)
        .map_err(xlsx_err)?;
    sheet.set_freeze_panes(1, 0).map_err(xlsx_err)?;

    workbook.save(&path).map_err(xlsx_err)?;
    info!(path = %path.display(), rows = rows.len(), %filter, "report written");
    Ok(path)
}

fn xlsx_err(e: rust_xlsxwriter::XlsxError) -> ZayavkaError {
    ZayavkaError::Internal(format!("xlsx write failed: {e}"))
}

/// Widest cell in the column (header included) plus padding.
fn column_width(rows: &[ReportRow], col: u16) -> f64 {
    let cell_len = |row: &ReportRow| -> usize {
        match col {
            0 => row.id.to_string().chars().count(),
            1 => row.full_name.chars().count(),
            2 => row.phone.as_deref().unwrap_or("").chars().count(),
            3 => row.email.as_deref().unwrap_or("").chars().count(),
            4 => row.category.chars().count(),
            5 => row.address.chars().count(),
            6 => row.description.chars().count(),
            7 => row.status.chars().count(),
            8 => row.created_at.chars().count(),
            _ => row.assignee_name.as_deref().unwrap_or("").chars().count(),
        }
    };
    let widest = rows
        .iter()
        .map(cell_len)
        .chain(std::iter::once(HEADERS[col as usize].chars().count()))
        .max()
        .unwrap_or(0);
    (widest + 2) as f64
}

/// `<filter>_<sha256 hex>.xlsx`, hashed over the filter, the current
/// timestamp, and a random component.
fn report_filename(filter: ReportFilter) -> String {
    let nonce: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    let seed = format!("{filter}_{}_{nonce}", local_now().format("%Y-%m-%d %H:%M:%S%.f"));
    let digest = Sha256::digest(seed.as_bytes());
    format!("{filter}_{}.xlsx", hex::encode(digest))
}
