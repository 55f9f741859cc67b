//! `pubtab inspect`: run the detectors on one raw file

use std::path::Path;

use anyhow::{Context, Result};
use pubtab_core::{DataStartRule, Grid, Settings, Variant, WorkbookStore};
use pubtab_engine::assemble::sheet_footer;
use pubtab_engine::{locate_block, locate_region_blocks, resolve_period, InputName, PeriodScan};
use pubtab_xlsx::XlsxStore;

use crate::report::{BlockBounds, Inspection};

pub fn inspect(path: &Path, settings: &Settings) -> Result<Inspection> {
    let input = InputName::parse(path)?;
    let vocab = settings.vocabulary();
    let spec = settings.table_spec(input.kind, Variant::Internal);

    let raw = XlsxStore::new()
        .open_raw(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let sheet = raw
        .primary(&spec.raw_sheet)
        .with_context(|| format!("{} has no sheets", path.display()))?;

    let scan = PeriodScan {
        rows: settings.period_scan_rows,
        cols: settings.period_scan_cols,
    };
    let blocks = match spec.data_start {
        DataStartRule::RegionBlocks { .. } => locate_region_blocks(sheet, &spec, &vocab)
            .into_iter()
            .map(|r| BlockBounds::new(Some(r.region), r.block))
            .collect(),
        DataStartRule::TotalLabel { .. } => {
            vec![BlockBounds::new(None, locate_block(sheet, &spec, &vocab))]
        }
    };

    Ok(Inspection {
        file: path.to_path_buf(),
        table: input.kind.number(),
        token: input.token.map(|t| t.to_string()),
        annual: input.is_annual(),
        sheet: sheet.name().to_string(),
        period: resolve_period(sheet, &vocab, scan),
        blocks,
        footer_start_row: sheet_footer(sheet, &spec, &vocab),
    })
}
