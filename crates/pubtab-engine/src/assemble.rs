//! Table assembly
//!
//! One raw file in, two artifacts out. Stages run strictly in order:
//!
//! ```text
//! LoadRaw -> ResolvePeriod -> BuildInternal -> BuildExternal -> Save -> Done
//! ```
//!
//! Layouts are checked before anything is read, so a missing template
//! never leaves a partial output behind. Heuristic misses (no period, no
//! data block, no copyright line) only drop the affected field.

use std::path::{Path, PathBuf};

use chrono::Datelike;
use pubtab_core::{
    DataStartRule, Grid, MergeAnchorIndex, PeriodToken, ProgressLog, PubtabError, RawWorkbook,
    Result, Settings, Sheet, StyledBook, TableKind, TableSpec, Variant, Vocabulary, WorkbookStore,
};

use crate::batch::FileOutcome;
use crate::footer::normalize_footer;
use crate::format::format_numbers;
use crate::highlight::highlight_rows;
use crate::locate::{block_from, find_footer_start, locate_block, locate_region_blocks, DataBlock};
use crate::period::{classify, resolve_period, starts_with_year, PeriodScan, ResolvedPeriod};
use crate::transcribe::{row_count, transcribe};

// ============================================================================
// Stages
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    LoadRaw,
    ResolvePeriod,
    BuildInternal,
    BuildExternal,
    Save,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::LoadRaw => "load-raw",
            Stage::ResolvePeriod => "resolve-period",
            Stage::BuildInternal => "build-internal",
            Stage::BuildExternal => "build-external",
            Stage::Save => "save",
            Stage::Done => "done",
        }
    }
}

/// Facts derived from an input file name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputName {
    pub kind: TableKind,
    pub token: Option<PeriodToken>,
    /// File name without extension; output names extend it
    pub stem: String,
}

impl InputName {
    pub fn parse(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| PubtabError::UnknownInput(path.display().to_string()))?;
        let kind = TableKind::from_file_name(name)
            .ok_or_else(|| PubtabError::UnknownInput(name.to_string()))?;
        let stem = Path::new(name)
            .file_stem()
            .map_or_else(|| name.to_string(), |s| s.to_string_lossy().into_owned());
        Ok(Self {
            kind,
            token: PeriodToken::from_file_name(name),
            stem,
        })
    }

    pub fn is_annual(&self) -> bool {
        self.token.is_some_and(|t| t.is_annual())
    }

    /// `<stem>_INTERN.xlsx` / `<stem>_g.xlsx`
    pub fn output_name(&self, variant: Variant) -> String {
        format!("{}{}.xlsx", self.stem, variant.suffix())
    }
}

/// Rows written into one layout block
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockSummary {
    pub template_first_row: u32,
    pub rows: u32,
}

// ============================================================================
// Assembler
// ============================================================================

/// Produces the internal and external artifacts for raw input files.
///
/// Configuration and the store are passed in at construction; nothing is
/// read from process-wide state.
pub struct Assembler<'a, S: WorkbookStore> {
    settings: Settings,
    vocab: Vocabulary,
    store: &'a S,
    sink: &'a dyn ProgressLog,
    as_of: String,
    year: i32,
}

impl<'a, S: WorkbookStore> Assembler<'a, S> {
    pub fn new(settings: Settings, store: &'a S, sink: &'a dyn ProgressLog) -> Self {
        let today = chrono::Local::now().date_naive();
        Self {
            vocab: settings.vocabulary(),
            settings,
            store,
            sink,
            as_of: today.format("%d.%m.%Y").to_string(),
            year: today.year(),
        }
    }

    /// Text placed after the as-of label (default: today, `dd.mm.yyyy`).
    pub fn with_as_of(mut self, text: impl Into<String>) -> Self {
        self.as_of = text.into();
        self
    }

    /// Year written into copyright lines (default: the current year).
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    pub(crate) fn log(&self, message: &str) {
        self.sink.log(message);
    }

    fn enter(&self, stage: Stage, file: &str) {
        tracing::debug!(stage = stage.as_str(), file, "stage");
    }

    fn scan(&self) -> PeriodScan {
        PeriodScan {
            rows: self.settings.period_scan_rows,
            cols: self.settings.period_scan_cols,
        }
    }

    fn spec(&self, kind: TableKind, variant: Variant) -> TableSpec {
        self.settings.table_spec(kind, variant)
    }

    fn require_layout(&self, kind: TableKind, variant: Variant) -> Result<PathBuf> {
        let path = self.settings.template_path(kind, variant);
        if self.store.exists(&path) {
            Ok(path)
        } else {
            Err(PubtabError::TemplateMissing {
                kind,
                variant,
                path,
            })
        }
    }

    /// Whether the external artifact is derived from the raw file itself.
    fn is_annual_copy(&self, input: &InputName) -> bool {
        input.is_annual() && self.spec(input.kind, Variant::External).annual_from_raw
    }

    /// Process one raw file into `<stem>_INTERN.xlsx` and `<stem>_g.xlsx`
    /// below `output_dir`.
    pub fn process_file(&self, raw_path: &Path, output_dir: &Path) -> Result<FileOutcome> {
        let input = InputName::parse(raw_path)?;
        let tag = format!("[T{}]", input.kind);
        let annual = self.is_annual_copy(&input);

        // Fatal configuration problems surface before any output exists.
        self.require_layout(input.kind, Variant::Internal)?;
        if !annual {
            self.require_layout(input.kind, Variant::External)?;
        }

        let internal_out = output_dir.join(input.output_name(Variant::Internal));
        let external_out = output_dir.join(input.output_name(Variant::External));
        if !self.settings.overwrite
            && self.store.exists(&internal_out)
            && self.store.exists(&external_out)
        {
            let reason = "outputs exist and overwrite is disabled".to_string();
            self.log(&format!("{tag} [SKIP] {}: {reason}", input.stem));
            return Ok(FileOutcome::Skipped { reason });
        }

        self.enter(Stage::LoadRaw, &input.stem);
        let raw = self.store.open_raw(raw_path)?;
        let internal_spec = self.spec(input.kind, Variant::Internal);
        let primary = raw
            .primary(&internal_spec.raw_sheet)
            .ok_or_else(|| PubtabError::SheetNotFound {
                path: raw_path.to_path_buf(),
                sheet: internal_spec.raw_sheet.clone(),
            })?;

        self.enter(Stage::ResolvePeriod, &input.stem);
        let period = resolve_period(primary, &self.vocab, self.scan());
        match &period {
            Some(found) => tracing::info!(
                file = %input.stem,
                label = %found.period.label,
                granularity = %found.period.granularity,
                "period resolved"
            ),
            None => tracing::warn!(file = %input.stem, "no period label found; field omitted"),
        }

        self.enter(Stage::BuildInternal, &input.stem);
        let internal = self.build_internal(input.kind, &raw, period.as_ref())?;

        self.enter(Stage::BuildExternal, &input.stem);
        let external = self.build_external(input.kind, raw_path, &raw, period.as_ref(), annual)?;

        self.enter(Stage::Save, &input.stem);
        self.store.save(&internal, &internal_out)?;
        self.log(&format!("{tag} INTERN -> {}", internal_out.display()));
        self.store.save(&external, &external_out)?;
        if annual {
            self.log(&format!(
                "{tag} _g (annual: raw copy + highlighting) -> {}",
                external_out.display()
            ));
        } else {
            self.log(&format!("{tag} _g -> {}", external_out.display()));
        }

        self.enter(Stage::Done, &input.stem);
        Ok(FileOutcome::Written {
            internal: internal_out,
            external: external_out,
        })
    }

    /// Populate a fresh copy of the internal layout.
    pub fn build_internal(
        &self,
        kind: TableKind,
        raw: &RawWorkbook,
        period: Option<&ResolvedPeriod>,
    ) -> Result<S::Book> {
        let spec = self.spec(kind, Variant::Internal);
        let layout = self.require_layout(kind, Variant::Internal)?;
        self.build_from_layout(&layout, raw, period, &spec)
    }

    /// Populate the external artifact.
    ///
    /// With `annual` set (and a kind that supports it) the raw file itself
    /// is reopened with styles and edited; every original column survives.
    pub fn build_external(
        &self,
        kind: TableKind,
        raw_path: &Path,
        raw: &RawWorkbook,
        period: Option<&ResolvedPeriod>,
        annual: bool,
    ) -> Result<S::Book> {
        let spec = self.spec(kind, Variant::External);
        if annual && spec.annual_from_raw {
            return self.build_annual_copy(raw_path, period, &spec);
        }
        let layout = self.require_layout(kind, Variant::External)?;
        self.build_from_layout(&layout, raw, period, &spec)
    }

    fn build_from_layout(
        &self,
        layout: &Path,
        raw: &RawWorkbook,
        period: Option<&ResolvedPeriod>,
        spec: &TableSpec,
    ) -> Result<S::Book> {
        let mut book = self.store.open_styled(layout)?;
        if book.sheet_count() == 0 {
            return Err(PubtabError::Workbook {
                path: layout.to_path_buf(),
                message: "layout has no sheets".into(),
            });
        }

        match spec.data_start {
            DataStartRule::RegionBlocks { .. } => self.fill_regions(&mut book, raw, period, spec),
            DataStartRule::TotalLabel { .. } => {
                let source = raw.primary(&spec.raw_sheet).ok_or_else(|| {
                    PubtabError::SheetNotFound {
                        path: layout.to_path_buf(),
                        sheet: spec.raw_sheet.clone(),
                    }
                })?;
                if let Some(mut sheet) = book.sheet_mut(0) {
                    self.fill_sheet(source, &mut sheet, period, spec);
                }
            }
        }
        Ok(book)
    }

    fn build_annual_copy(
        &self,
        raw_path: &Path,
        period: Option<&ResolvedPeriod>,
        spec: &TableSpec,
    ) -> Result<S::Book> {
        let mut book = self.store.open_styled(raw_path)?;
        let index = book.index_of(&spec.raw_sheet).unwrap_or(0);
        {
            let mut sheet = book.sheet_mut(index).ok_or_else(|| PubtabError::SheetNotFound {
                path: raw_path.to_path_buf(),
                sheet: spec.raw_sheet.clone(),
            })?;
            let anchors = MergeAnchorIndex::build(&sheet);

            match period {
                Some(found) => {
                    let label = found.period.label.clone().into();
                    anchors.write(&mut sheet, found.row, found.col, label);
                }
                None => tracing::warn!(sheet = sheet.name(), "annual copy without period label"),
            }

            normalize_footer(
                &mut sheet,
                &self.as_of,
                &self.vocab,
                self.year,
                self.settings.footer_window,
            );
            if let Some(col) = spec.marker_col {
                let rows = highlight_rows(&mut sheet, col, &self.settings.highlight_color);
                tracing::debug!(rows, "rows highlighted");
            }
        }
        Ok(book)
    }

    // ------------------------------------------------------------------------
    // Sheet filling
    // ------------------------------------------------------------------------

    /// Title rows, optional continued title, banner and period label.
    /// Returns the anchor index of the layout sheet.
    fn fill_header<R, G>(
        &self,
        raw: &R,
        layout: &mut G,
        period: Option<&ResolvedPeriod>,
        spec: &TableSpec,
    ) -> MergeAnchorIndex
    where
        R: Grid + ?Sized,
        G: Grid + ?Sized,
    {
        let anchors = MergeAnchorIndex::build(&*layout);

        for &row in &spec.title_rows {
            let value = raw.value(row, 1);
            if !value.is_empty() {
                anchors.write(layout, row, 1, value);
            }
        }

        let continued = spec.continued_title_row.and_then(|row| {
            raw.text(row, 1)
                .filter(|t| !starts_with_year(t) && classify(t, &self.vocab).is_none())
                .map(|text| (row, text))
        });
        if let Some((row, text)) = &continued {
            anchors.write(layout, *row, 1, text.clone().into());
        }

        if spec.variant == Variant::Internal {
            if let Some((row, col)) = spec.banner_cell {
                anchors.write(layout, row, col, self.vocab.internal_banner.clone().into());
            }
        }

        if let Some(found) = period {
            let row = spec.period_row_for(continued.is_some());
            anchors.write(layout, row, 1, found.period.label.clone().into());
        }
        anchors
    }

    /// Transcribe and format one block pair.
    fn fill_block<R, G>(
        &self,
        raw: &R,
        raw_block: DataBlock,
        layout: &mut G,
        layout_block: DataBlock,
        anchors: &MergeAnchorIndex,
        spec: &TableSpec,
    ) -> BlockSummary
    where
        R: Grid + ?Sized,
        G: Grid + ?Sized,
    {
        let Some(raw_first) = raw_block.first_data_row else {
            tracing::warn!(sheet = raw.name(), "no data block in raw sheet; nothing transcribed");
            return BlockSummary::default();
        };
        let layout_block = match layout_block.first_data_row {
            Some(_) => layout_block,
            None => block_from(&*layout, raw_first, spec, &self.vocab),
        };
        let layout_first = layout_block.first_data_row.unwrap_or(raw_first);

        let rows = row_count(&raw_block, &layout_block);
        let width = raw.max_col().min(layout.max_col());
        let stats = transcribe(
            raw,
            raw_first,
            layout,
            layout_first,
            rows,
            spec.first_col..=width,
            anchors,
        );
        let formatted = format_numbers(
            layout,
            spec,
            layout_first..layout_first + rows,
            width,
            &self.vocab,
        );
        tracing::debug!(
            sheet = layout.name(),
            raw_first,
            layout_first,
            rows,
            written = stats.written,
            integers = formatted.integers,
            percents = formatted.percents,
            "block transcribed"
        );
        BlockSummary {
            template_first_row: layout_first,
            rows,
        }
    }

    fn finish_sheet<G: Grid + ?Sized>(&self, layout: &mut G, spec: &TableSpec) {
        if normalize_footer(
            layout,
            &self.as_of,
            &self.vocab,
            self.year,
            self.settings.footer_window,
        )
        .is_none()
        {
            tracing::warn!(sheet = layout.name(), "no copyright line; footer left as is");
        }
        if spec.variant == Variant::External {
            if let Some(col) = spec.marker_col {
                highlight_rows(layout, col, &self.settings.highlight_color);
            }
        }
    }

    fn fill_sheet<G: Grid + ?Sized>(
        &self,
        raw: &Sheet,
        layout: &mut G,
        period: Option<&ResolvedPeriod>,
        spec: &TableSpec,
    ) -> BlockSummary {
        let anchors = self.fill_header(raw, layout, period, spec);
        let raw_block = locate_block(raw, spec, &self.vocab);
        let layout_block = locate_block(&*layout, spec, &self.vocab);
        let summary = self.fill_block(raw, raw_block, layout, layout_block, &anchors, spec);
        self.finish_sheet(layout, spec);
        summary
    }

    /// Table kind 5: raw region blocks are collected across the whole raw
    /// workbook (sheet order, then row order) and handed to the layout
    /// sheets in order. Each layout sheet takes as many raw blocks as it
    /// has region blocks of its own, so one raw sheet holding every region
    /// fans out over one layout sheet per region.
    fn fill_regions<B: StyledBook>(
        &self,
        book: &mut B,
        raw: &RawWorkbook,
        period: Option<&ResolvedPeriod>,
        spec: &TableSpec,
    ) {
        let raw_blocks: Vec<(&Sheet, DataBlock)> = raw
            .sheets
            .iter()
            .flat_map(|sheet| {
                self.region_blocks(sheet, spec)
                    .into_iter()
                    .map(move |block| (sheet, block))
            })
            .collect();
        let available = raw_blocks.len();
        let mut cursor = raw_blocks.into_iter();
        let names = book.sheet_names();
        let mut total_blocks = 0;

        for (index, name) in names.iter().enumerate() {
            let Some(mut sheet) = book.sheet_mut(index) else {
                continue;
            };
            let layout_blocks = self.region_blocks(&sheet, spec);
            let assigned: Vec<(&Sheet, DataBlock)> =
                cursor.by_ref().take(layout_blocks.len()).collect();
            if assigned.len() < layout_blocks.len() {
                tracing::warn!(
                    sheet = name.as_str(),
                    layout = layout_blocks.len(),
                    raw = assigned.len(),
                    "raw region blocks exhausted; remaining layout blocks left untouched"
                );
            }

            let Some(source) = assigned
                .first()
                .map(|(source, _)| *source)
                .or_else(|| raw.sheet_named(name))
                .or_else(|| raw.primary(&spec.raw_sheet))
            else {
                continue;
            };
            let own_period = resolve_period(source, &self.vocab, self.scan());
            let sheet_period = own_period.as_ref().or(period);
            let anchors = self.fill_header(source, &mut sheet, sheet_period, spec);

            for ((raw_sheet, raw_block), layout_block) in assigned.into_iter().zip(layout_blocks) {
                self.fill_block(raw_sheet, raw_block, &mut sheet, layout_block, &anchors, spec);
                total_blocks += 1;
            }
            self.finish_sheet(&mut sheet, spec);
        }

        if total_blocks < available {
            tracing::warn!(
                raw = available,
                transcribed = total_blocks,
                "layout has fewer region blocks than the raw file; extra raw blocks dropped"
            );
        }
        self.log(&format!(
            "[T{}] {} region blocks transcribed ({})",
            spec.kind, total_blocks, spec.variant
        ));
    }

    /// Region blocks of a sheet; a sheet without headings is one block.
    fn region_blocks<G: Grid + ?Sized>(&self, grid: &G, spec: &TableSpec) -> Vec<DataBlock> {
        let regions = locate_region_blocks(grid, spec, &self.vocab);
        if regions.is_empty() {
            let block = locate_block(grid, spec, &self.vocab);
            return if block.first_data_row.is_some() {
                vec![block]
            } else {
                Vec::new()
            };
        }
        regions
            .into_iter()
            .map(|region| region.block)
            .filter(|block| block.first_data_row.is_some())
            .collect()
    }
}

/// Footer start of a sheet scanned from its first row; exposed for the
/// inspect command.
pub fn sheet_footer<G: Grid + ?Sized>(grid: &G, spec: &TableSpec, vocab: &Vocabulary) -> u32 {
    find_footer_start(grid, 1, spec.footnote_col, vocab)
}

// ============================================================================
// Tests
// ============================================================================
