//! End-to-end assembly against the in-memory store
//!
//! Fixtures mirror real publication tables: titles in rows 1-2, the
//! period line, a header row, the data block starting at "Total", a
//! footnote line and the copyright line.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use pubtab_core::{
    CellValue, DisplayFormat, Grid, MergeRange, Settings, Sheet, TableKind, Variant, Vocabulary,
};
use pubtab_engine::{display_text, Assembler, FileOutcome, Job, MemoryStore};

const AS_OF: &str = "15.10.2026";
const FILL: &str = "FFFFFF99";

// ============================================================================
// Fixtures
// ============================================================================

fn settings() -> Settings {
    Settings {
        layout_dir: PathBuf::from("layouts"),
        ..Settings::default()
    }
}

fn layout_path(kind: TableKind, variant: Variant) -> PathBuf {
    settings().template_path(kind, variant)
}

/// Raw table 1: data rows 7-10, footnote at 11, copyright at 12.
fn raw_table_one(period: &str) -> Sheet {
    let mut s = Sheet::new("Tabelle 1");
    s.set(1, 1, "Free State")
        .set(2, 1, "Employees by sector")
        .set(3, 1, period);
    for (idx, head) in ["Sector", "Employees", "Men", "Women", "Foreign", "Share", "Review"]
        .iter()
        .enumerate()
    {
        s.set(5, idx as u32 + 1, *head);
    }
    s.set(7, 1, "Total")
        .set(7, 2, 5000.4)
        .set(7, 3, 2600.0)
        .set(7, 4, 2400.0)
        .set(7, 5, 300.0)
        .set(7, 6, 12.345);
    s.set(8, 1, "Mining")
        .set(8, 2, 1234.5)
        .set(8, 3, "-")
        .set(8, 4, 600.0)
        .set(8, 5, "X")
        .set(8, 6, 0.0)
        .set(8, 7, 1.0);
    s.set(9, 1, "Energy")
        .set(9, 2, -1234.0)
        .set(9, 3, 10.0)
        .set(9, 4, 20.0)
        .set(9, 5, 30.0)
        .set(9, 6, 4.25)
        .set(9, 7, 3.0);
    s.set(11, 1, "- Provisional figures")
        .set(12, 1, "© Statistical Office 2024");
    s
}

/// Layout for table 1: data block starts at `top`.
fn layout_table_one(variant: Variant) -> Sheet {
    let internal = variant == Variant::Internal;
    let top = if internal { 9 } else { 7 };
    let mut s = Sheet::new("Tabelle 1");
    s.merge(MergeRange::new(1, 1, 1, 7));
    s.set(1, 1, "<title>").set(2, 1, "<subtitle>");
    if internal {
        s.set(3, 1, "<banner>").set(5, 1, "<period>");
    } else {
        s.set(3, 1, "<period>");
    }
    s.set(top - 2, 1, "Sector");
    s.set(top, 1, "Total");
    for row in top..top + 3 {
        for col in 2..=7 {
            s.set(row, col, 0.0);
        }
    }
    s.set(top + 4, 1, "- Provisional figures")
        .set(top + 5, 1, "© Statistical Office 2023")
        .set(top + 5, 7, "As of: 01.01.2024");
    s.style_mut(top + 5, 1).italic = true;
    s
}

fn stamps(sheet: &Sheet) -> Vec<((u32, u32), String)> {
    let vocab = Vocabulary::english();
    sheet
        .filled_cells()
        .filter_map(|(pos, v)| {
            v.as_text()
                .filter(|t| vocab.is_stamp(t))
                .map(|t| (pos, t.to_string()))
        })
        .collect()
}

fn single(store: &MemoryStore, path: &Path) -> Sheet {
    let mut sheets = store.get(path).unwrap_or_else(|| panic!("{} not written", path.display()));
    sheets.remove(0)
}

fn store_with_table_one(raw_name: &str, period: &str, external_layout: bool) -> MemoryStore {
    let store = MemoryStore::new();
    store.insert(format!("in/{raw_name}"), vec![raw_table_one(period)]);
    store.insert(
        layout_path(TableKind::One, Variant::Internal),
        vec![layout_table_one(Variant::Internal)],
    );
    if external_layout {
        store.insert(
            layout_path(TableKind::One, Variant::External),
            vec![layout_table_one(Variant::External)],
        );
    }
    store
}

fn assembler<'a>(
    store: &'a MemoryStore,
    sink: &'a dyn pubtab_core::ProgressLog,
) -> Assembler<'a, MemoryStore> {
    Assembler::new(settings(), store, sink)
        .with_as_of(AS_OF)
        .with_year(2026)
}

// ============================================================================
// Table 1, monthly
// ============================================================================

#[test]
fn monthly_table_one_produces_both_variants() {
    let store = store_with_table_one("Tabelle-1-Land_2025-12.xlsx", "December 2025", true);
    let lines = RefCell::new(Vec::new());
    let sink = |m: &str| lines.borrow_mut().push(m.to_string());

    let outcome = assembler(&store, &sink)
        .process_file(Path::new("in/Tabelle-1-Land_2025-12.xlsx"), Path::new("out"))
        .unwrap();
    let FileOutcome::Written { internal, external } = outcome else {
        panic!("expected written outputs");
    };
    assert_eq!(internal, PathBuf::from("out/Tabelle-1-Land_2025-12_INTERN.xlsx"));
    assert_eq!(external, PathBuf::from("out/Tabelle-1-Land_2025-12_g.xlsx"));

    let vocab = Vocabulary::english();
    let int = single(&store, &internal);
    assert_eq!(int.value(1, 1), CellValue::from("Free State"));
    assert_eq!(int.value(3, 1), CellValue::from("For internal use only"));
    assert_eq!(int.value(5, 1), CellValue::from("December 2025"));
    assert_eq!(int.value(9, 2), CellValue::Number(5000.0));
    assert_eq!(int.style(9, 2).display, DisplayFormat::IntegerGrouped);
    assert_eq!(int.value(10, 3), CellValue::from("-"));
    assert_eq!(
        display_text(&int.value(11, 2), int.style(11, 2).display, &vocab),
        "- 1 234"
    );
    assert_eq!(
        display_text(&int.value(9, 6), int.style(9, 6).display, &vocab),
        "12.3"
    );
    assert_eq!(
        display_text(&int.value(10, 6), int.style(10, 6).display, &vocab),
        "0"
    );
    assert_eq!(int.style(10, 1).fill, None);
    assert_eq!(int.value(14, 1), CellValue::from("© Statistical Office 2026"));
    assert_eq!(stamps(&int), vec![((14, 7), "As of: 15.10.2026".to_string())]);

    let ext = single(&store, &external);
    assert_eq!(ext.value(3, 1), CellValue::from("December 2025"));
    assert_eq!(ext.value(8, 1), CellValue::from("Mining"));
    for col in 1..=7 {
        assert_eq!(ext.style(8, col).fill.as_deref(), Some(FILL), "column {col}");
        assert_eq!(ext.style(9, col).fill, None);
        assert_eq!(ext.style(7, col).fill, None);
    }
    assert_eq!(
        display_text(&ext.value(8, 2), ext.style(8, 2).display, &vocab),
        "1 235"
    );
    assert_eq!(ext.value(8, 5), CellValue::from("X"));
    assert_eq!(stamps(&ext).len(), 1);

    let lines = lines.borrow();
    assert!(lines.iter().any(|l| l.starts_with("[T1] INTERN -> ")));
    assert!(lines.iter().any(|l| l.starts_with("[T1] _g -> ")));
}

#[test]
fn repeated_runs_give_identical_outputs() {
    let store = store_with_table_one("Tabelle-1-Land_2025-12.xlsx", "December 2025", true);
    let sink = |_: &str| {};
    let asm = assembler(&store, &sink);
    let raw = Path::new("in/Tabelle-1-Land_2025-12.xlsx");
    let out = Path::new("out/Tabelle-1-Land_2025-12_g.xlsx");

    asm.process_file(raw, Path::new("out")).unwrap();
    let first = store.get(out).unwrap();
    asm.process_file(raw, Path::new("out")).unwrap();
    assert_eq!(store.get(out).unwrap(), first);
}

#[test]
fn missing_period_is_omitted() {
    let store = store_with_table_one("Tabelle-1-Land_2025-12.xlsx", "", true);
    let sink = |_: &str| {};
    assembler(&store, &sink)
        .process_file(Path::new("in/Tabelle-1-Land_2025-12.xlsx"), Path::new("out"))
        .unwrap();

    let ext = single(&store, Path::new("out/Tabelle-1-Land_2025-12_g.xlsx"));
    assert_eq!(ext.value(3, 1), CellValue::from("<period>"));
    assert_eq!(ext.value(7, 2), CellValue::Number(5000.0));
}

#[test]
fn missing_external_layout_aborts_before_output() {
    let store = store_with_table_one("Tabelle-1-Land_2025-12.xlsx", "December 2025", false);
    let sink = |_: &str| {};
    let err = assembler(&store, &sink)
        .process_file(Path::new("in/Tabelle-1-Land_2025-12.xlsx"), Path::new("out"))
        .unwrap_err();
    assert!(err.is_configuration());
    assert!(!store.exists_any_under("out"));
}

trait StoreExt {
    fn exists_any_under(&self, prefix: &str) -> bool;
}

impl StoreExt for MemoryStore {
    fn exists_any_under(&self, prefix: &str) -> bool {
        self.paths().iter().any(|p| p.starts_with(prefix))
    }
}

#[test]
fn overwrite_protection_skips_existing_outputs() {
    let store = store_with_table_one("Tabelle-1-Land_2025-12.xlsx", "December 2025", true);
    let marker = vec![Sheet::new("old")];
    store.insert("out/Tabelle-1-Land_2025-12_INTERN.xlsx", marker.clone());
    store.insert("out/Tabelle-1-Land_2025-12_g.xlsx", marker.clone());

    let sink = |_: &str| {};
    let settings = Settings {
        overwrite: false,
        ..settings()
    };
    let outcome = Assembler::new(settings, &store, &sink)
        .process_file(Path::new("in/Tabelle-1-Land_2025-12.xlsx"), Path::new("out"))
        .unwrap();

    assert!(matches!(outcome, FileOutcome::Skipped { .. }));
    assert_eq!(
        store.get(Path::new("out/Tabelle-1-Land_2025-12_g.xlsx")),
        Some(marker)
    );
}

// ============================================================================
// Table 1, annual
// ============================================================================

#[test]
fn annual_table_one_external_is_the_raw_copy() {
    let mut raw = raw_table_one(" 2025");
    raw.set(5, 10, "Change")
        .set(5, 11, "Change %")
        .set(7, 10, 120.0)
        .set(7, 11, 2.4)
        .set(8, 10, -3.0)
        .set(8, 11, -0.2)
        .set(12, 9, "As of: 01.03.2025")
        .set(2, 11, "As of: 01.01.2025");

    let store = MemoryStore::new();
    store.insert("in/Tabelle-1-Land_2025-JJ.xlsx", vec![raw]);
    store.insert(
        layout_path(TableKind::One, Variant::Internal),
        vec![layout_table_one(Variant::Internal)],
    );
    let lines = RefCell::new(Vec::new());
    let sink = |m: &str| lines.borrow_mut().push(m.to_string());

    let outcome = assembler(&store, &sink)
        .process_file(Path::new("in/Tabelle-1-Land_2025-JJ.xlsx"), Path::new("out"))
        .unwrap();
    assert!(matches!(outcome, FileOutcome::Written { .. }));

    let ext = single(&store, Path::new("out/Tabelle-1-Land_2025-JJ_g.xlsx"));
    assert_eq!(ext.value(3, 1), CellValue::from("Year 2025"));
    assert_eq!(ext.value(7, 10), CellValue::Number(120.0));
    assert_eq!(ext.value(8, 11), CellValue::Number(-0.2));
    assert_eq!(ext.value(12, 1), CellValue::from("© Statistical Office 2026"));
    assert_eq!(stamps(&ext), vec![((12, 9), "As of: 15.10.2026".to_string())]);
    for col in 1..=11 {
        assert_eq!(ext.style(8, col).fill.as_deref(), Some(FILL), "column {col}");
    }

    let int = single(&store, Path::new("out/Tabelle-1-Land_2025-JJ_INTERN.xlsx"));
    assert_eq!(int.value(5, 1), CellValue::from("Year 2025"));
    assert_eq!(int.max_col(), 7);

    assert!(lines.borrow().iter().any(|l| l.contains("annual")));
}

// ============================================================================
// Table 2, continued title
// ============================================================================

fn raw_table_two() -> Sheet {
    let mut s = Sheet::new("Tabelle 2");
    s.set(1, 1, "Free State")
        .set(2, 1, "Employees by age")
        .set(3, 1, "continued: by age group")
        .set(4, 1, "December 2025");
    s.set(8, 1, 1.0)
        .set(8, 2, "Total")
        .set(8, 3, 100.4)
        .set(8, 8, 55.55);
    s.set(9, 1, 2.0)
        .set(9, 2, "Under 25")
        .set(9, 3, 20.0)
        .set(9, 8, "12.04");
    s.set(11, 1, "- Provisional").set(12, 1, "© Statistical Office 2025");
    s
}

fn layout_table_two() -> Sheet {
    let mut s = Sheet::new("Tabelle 2");
    s.set(3, 1, "<line 3>").set(4, 1, "<line 4>");
    s.set(8, 1, "A").set(8, 2, "Total");
    for row in 8..=9 {
        for col in 3..=8 {
            s.set(row, col, 0.0);
        }
    }
    s.set(11, 1, "- Provisional").set(12, 1, "© Statistical Office 2023");
    s
}

#[test]
fn continued_title_moves_period_down() {
    let store = MemoryStore::new();
    store.insert("in/Tabelle-2-Land_2025-12.xlsx", vec![raw_table_two()]);
    for variant in [Variant::Internal, Variant::External] {
        store.insert(layout_path(TableKind::Two, variant), vec![layout_table_two()]);
    }
    let sink = |_: &str| {};
    assembler(&store, &sink)
        .process_file(Path::new("in/Tabelle-2-Land_2025-12.xlsx"), Path::new("out"))
        .unwrap();

    let ext = single(&store, Path::new("out/Tabelle-2-Land_2025-12_g.xlsx"));
    assert_eq!(ext.value(3, 1), CellValue::from("continued: by age group"));
    assert_eq!(ext.value(4, 1), CellValue::from("December 2025"));
    assert_eq!(ext.value(8, 1), CellValue::from("A"));
    assert_eq!(ext.value(8, 3), CellValue::Number(100.0));
    assert_eq!(ext.value(9, 8), CellValue::Number(12.04));
    assert_eq!(ext.style(9, 8).display, DisplayFormat::PercentOneDecimal);

    let int = single(&store, Path::new("out/Tabelle-2-Land_2025-12_INTERN.xlsx"));
    assert_eq!(int.value(4, 1), CellValue::from("December 2025"));
    assert_eq!(int.value(5, 1), CellValue::from("For internal use only"));
}

// ============================================================================
// Table 5, region blocks
// ============================================================================

fn regions(sheet: &mut Sheet, north: u32, south: u32) {
    for (heading, name, base) in [(north, "North 1)", 10.0), (south, "South 1)", 30.0)] {
        sheet.set(heading, 1, name);
        sheet.set(heading + 1, 1, "Total").set(heading + 2, 1, "Services");
        sheet
            .set(heading + 1, 2, base)
            .set(heading + 1, 3, base + 10.0)
            .set(heading + 2, 2, base / 10.0 + 3.0)
            .set(heading + 2, 3, base / 10.0 + 4.0);
    }
}

#[test]
fn region_blocks_are_paired_in_order() {
    let mut raw = Sheet::new("Tabelle 5");
    raw.set(1, 1, "Free State")
        .set(2, 1, "Employees by region")
        .set(3, 1, "2nd Quarter 2025");
    regions(&mut raw, 5, 9);
    raw.set(13, 1, "- 1) Administrative regions")
        .set(14, 1, "© Statistical Office 2024");

    let mut layout = Sheet::new("Tabelle 5");
    layout.set(3, 1, "<period>");
    regions(&mut layout, 6, 10);
    for row in [7, 8, 11, 12] {
        layout.set(row, 2, 0.0).set(row, 3, 0.0);
    }
    layout
        .set(14, 1, "- 1) Administrative regions")
        .set(15, 1, "© Statistical Office 2023");

    let store = MemoryStore::new();
    store.insert("in/Tabelle-5-Land_2025-Q2.xlsx", vec![raw]);
    for variant in [Variant::Internal, Variant::External] {
        store.insert(layout_path(TableKind::Five, variant), vec![layout.clone()]);
    }
    let lines = RefCell::new(Vec::new());
    let sink = |m: &str| lines.borrow_mut().push(m.to_string());
    assembler(&store, &sink)
        .process_file(Path::new("in/Tabelle-5-Land_2025-Q2.xlsx"), Path::new("out"))
        .unwrap();

    let ext = single(&store, Path::new("out/Tabelle-5-Land_2025-Q2_g.xlsx"));
    assert_eq!(ext.value(3, 1), CellValue::from("2nd Quarter 2025"));
    assert_eq!(ext.value(7, 2), CellValue::Number(10.0));
    assert_eq!(ext.value(8, 3), CellValue::Number(5.0));
    assert_eq!(ext.value(11, 2), CellValue::Number(30.0));
    assert_eq!(ext.value(12, 3), CellValue::Number(7.0));
    assert_eq!(ext.value(15, 1), CellValue::from("© Statistical Office 2026"));

    assert!(lines
        .borrow()
        .iter()
        .any(|l| l == "[T5] 2 region blocks transcribed (external)"));
}

/// Layout sheet holding the single region `name`, data rows 6-7.
fn region_sheet(name: &str) -> Sheet {
    let mut s = Sheet::new(name);
    s.set(3, 1, "<period>")
        .set(5, 1, format!("{name} 1)"))
        .set(6, 1, "Total")
        .set(7, 1, "Services");
    for row in [6, 7] {
        s.set(row, 2, 0.0).set(row, 3, 0.0);
    }
    s.set(9, 1, "- 1) Administrative regions")
        .set(10, 1, "© Statistical Office 2023");
    s
}

#[test]
fn one_raw_sheet_fans_out_over_region_sheets() {
    let mut raw = Sheet::new("Tabelle 5");
    raw.set(1, 1, "Free State").set(3, 1, "2nd Quarter 2025");
    regions(&mut raw, 5, 9);
    raw.set(13, 1, "- 1) Administrative regions")
        .set(14, 1, "© Statistical Office 2024");

    let store = MemoryStore::new();
    store.insert("in/Tabelle-5-Land_2025-Q2.xlsx", vec![raw]);
    for variant in [Variant::Internal, Variant::External] {
        store.insert(
            layout_path(TableKind::Five, variant),
            vec![region_sheet("North"), region_sheet("South")],
        );
    }
    let lines = RefCell::new(Vec::new());
    let sink = |m: &str| lines.borrow_mut().push(m.to_string());
    assembler(&store, &sink)
        .process_file(Path::new("in/Tabelle-5-Land_2025-Q2.xlsx"), Path::new("out"))
        .unwrap();

    let sheets = store
        .get(Path::new("out/Tabelle-5-Land_2025-Q2_g.xlsx"))
        .expect("external written");
    assert_eq!(sheets.len(), 2);
    let (north, south) = (&sheets[0], &sheets[1]);
    assert_eq!(north.value(6, 2), CellValue::Number(10.0));
    assert_eq!(north.value(7, 3), CellValue::Number(5.0));
    assert_eq!(south.value(6, 2), CellValue::Number(30.0));
    assert_eq!(south.value(7, 3), CellValue::Number(7.0));
    assert_eq!(south.value(3, 1), CellValue::from("2nd Quarter 2025"));
    assert_eq!(south.value(10, 1), CellValue::from("© Statistical Office 2026"));

    assert!(lines
        .borrow()
        .iter()
        .any(|l| l == "[T5] 2 region blocks transcribed (external)"));
}

// ============================================================================
// Batch
// ============================================================================

fn raw_table_three() -> Sheet {
    let mut s = Sheet::new("Tabelle 3");
    s.set(1, 1, "Free State").set(3, 1, "May 2025");
    s.set(6, 1, 1.0)
        .set(6, 2, "Total")
        .set(6, 3, 70.0)
        .set(6, 8, 35.0);
    s.set(7, 2, "Men").set(7, 3, 40.0).set(7, 8, "20");
    s.set(9, 1, "- note").set(10, 1, "© Statistical Office 2024");
    s
}

#[test]
fn batch_continues_past_failures() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("2025-05");
    std::fs::create_dir(&input).unwrap();
    for name in ["Tabelle-2-Land_2025-05.xlsx", "Tabelle-3-Land_2025-05.xlsx"] {
        std::fs::write(input.join(name), b"").unwrap();
    }

    let store = MemoryStore::new();
    store.insert(input.join("Tabelle-3-Land_2025-05.xlsx"), vec![raw_table_three()]);
    for variant in [Variant::Internal, Variant::External] {
        store.insert(layout_path(TableKind::Three, variant), vec![raw_table_three()]);
    }

    let lines = RefCell::new(Vec::new());
    let sink = |m: &str| lines.borrow_mut().push(m.to_string());
    let out = tmp.path().join("out");
    let jobs = [
        Job::new("month", &input),
        Job::new("quarter", tmp.path().join("missing")),
    ];
    let report = assembler(&store, &sink).run_batch(&jobs, &out);

    assert_eq!(report.files.len(), 2);
    assert_eq!(report.written(), 1);
    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].input.ends_with("Tabelle-2-Land_2025-05.xlsx"));
    assert!(matches!(
        failures[0].outcome,
        FileOutcome::Failed {
            configuration: true,
            ..
        }
    ));
    assert_eq!(report.skipped_jobs.len(), 1);
    assert_eq!(report.skipped_jobs[0].job, "quarter");

    let target = out.join("VÖ-Tabellen").join("2025-05");
    assert!(target.is_dir());
    let written = single(&store, &target.join("Tabelle-3-Land_2025-05_g.xlsx"));
    assert_eq!(written.value(7, 8), CellValue::Number(20.0));
    assert_eq!(written.value(3, 1), CellValue::from("May 2025"));

    let lines = lines.borrow();
    assert!(lines.iter().any(|l| l == "[START] Tabelle-2-Land_2025-05.xlsx"));
    assert!(lines.iter().any(|l| l.starts_with("[ERROR] Tabelle-2-Land_2025-05.xlsx")));
    assert_eq!(lines.last().map(String::as_str), Some("2 files: 1 written, 0 skipped, 1 failed"));
}
