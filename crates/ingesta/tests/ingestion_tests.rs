//! End-to-end tests: YAML definitions → source files → SQLite, through the
//! ingestion service.

mod common;

use serde_json::{json, Value};

use common::{Cell, JobBuilder, TaskBuilder, TestHarness, XlsxBuilder};
use ingesta::config::{FileType, SourceType};
use ingesta::{ExecuteCommand, Status};

const CLIENTES_TABLE: &str =
    "CREATE TABLE clientes (ID TEXT, NOMBRE TEXT, EDAD INTEGER, CIUDAD TEXT, ORIGEN TEXT);";

fn clientes_workbook() -> Vec<u8> {
    XlsxBuilder::new()
        .row(vec!["Nombre".into(), "Edad".into(), "Ciudad".into()])
        .row(vec!["  ana  ".into(), 31.into(), "san josé".into()])
        .row(vec!["luis".into(), 27.into(), "Cartago".into()])
        .build()
}

/// A job that loads `clientes.xlsx` into the `clientes` table.
fn clientes_job(harness: &TestHarness, name: &str) -> JobBuilder {
    let source = harness.write_input("clientes.xlsx", &clientes_workbook());
    JobBuilder::new(name, FileType::Excel, source.to_str().unwrap())
        .parameters("tableName: clientes")
        .task(
            TaskBuilder::persistence("carga", 1).step_with(
                "INSERT",
                "mappings:\n  - dbColumn: ORIGEN\n    constant: excel\n",
            ),
        )
}

fn missing_table_task(order: i32) -> TaskBuilder {
    TaskBuilder::persistence("carga-rota", order).step_with("INSERT", "tableName: no_existe")
}

#[test]
fn test_excel_job_end_to_end() {
    let harness = TestHarness::new();
    harness.execute_sql(CLIENTES_TABLE);
    harness.execute_sql("INSERT INTO clientes (NOMBRE) VALUES ('stale');");

    let source = harness.write_input("clientes.xlsx", &clientes_workbook());
    let definition = JobBuilder::new("clientes", FileType::Excel, source.to_str().unwrap())
        .parameters("tableName: clientes")
        .task(
            TaskBuilder::transformation("limpieza", 1)
                .step("TRIM")
                .step("UPPERCASE"),
        )
        .task(
            TaskBuilder::persistence("carga", 2)
                .step("TRUNCATE")
                .step_with(
                    "INSERT",
                    r#"
mappings:
  - dbColumn: ID
    autoGenerate: UUID
  - dbColumn: ORIGEN
    constant: excel
"#,
                )
                .step_with("SELECT", "query: SELECT COUNT(*) FROM clientes"),
        )
        .build();
    harness.write_job("clientes.yml", &definition);

    let report = harness.service().execute(&ExecuteCommand::from_scheduler());

    assert_eq!(report.status, Status::Success);
    assert!(!report.manually_triggered);
    assert_eq!(report.jobs.len(), 1);
    let job = &report.jobs[0];
    assert_eq!(job.status, Status::Success);
    assert_eq!(job.records_processed, 2);
    assert_eq!(job.records_failed, 0);
    assert!(job.tasks.iter().all(|t| t.status == Status::Success));
    assert_eq!(job.tasks[1].steps.len(), 3);

    let rows = harness.query("SELECT NOMBRE, EDAD, CIUDAD, ORIGEN FROM clientes ORDER BY NOMBRE");
    assert_eq!(
        rows,
        vec![
            vec![json!("ANA"), json!(31), json!("SAN JOSÉ"), json!("excel")],
            vec![json!("LUIS"), json!(27), json!("CARTAGO"), json!("excel")],
        ]
    );

    let ids = harness.query("SELECT ID FROM clientes");
    for id in ids {
        assert_eq!(id[0].as_str().map(str::len), Some(36));
    }

    assert!(harness.working_files().is_empty());
    assert!(source.exists());
}

#[test]
fn test_xml_job_with_explicit_mappings() {
    let harness = TestHarness::new();
    harness.execute_sql("CREATE TABLE personas (NOMBRE_COMPLETO TEXT, EDAD INTEGER, APELLIDO TEXT);");

    let source = harness.write_input(
        "personas.xml",
        r#"<?xml version="1.0" encoding="UTF-8"?>
<personas>
  <persona><nombre>Ana</nombre><apellido>Pérez</apellido><edad>31</edad></persona>
  <persona><nombre>Luis</nombre><apellido></apellido><edad>27</edad></persona>
</personas>"#
            .as_bytes(),
    );
    let definition = JobBuilder::new("personas", FileType::Xml, source.to_str().unwrap())
        .task(TaskBuilder::persistence("carga", 1).step_with(
            "INSERT",
            r#"
tableName: personas
autoMap: false
mappings:
  - dbColumn: NOMBRE_COMPLETO
    concatenate: [nombre, apellido]
    separator: " "
  - dbColumn: EDAD
    excelColumn: edad
"#,
        ))
        .build();
    harness.write_job("personas.yaml", &definition);

    let report = harness.service().execute(&ExecuteCommand::manual(Vec::new()));

    assert_eq!(report.status, Status::Success);
    assert!(report.manually_triggered);
    let rows = harness.query("SELECT NOMBRE_COMPLETO, EDAD, APELLIDO FROM personas ORDER BY EDAD");
    assert_eq!(
        rows,
        vec![
            vec![json!("Luis "), json!(27), Value::Null],
            vec![json!("Ana Pérez"), json!(31), Value::Null],
        ]
    );
}

#[test]
fn test_concatenate_step_output_is_mapped_explicitly() {
    let harness = TestHarness::new();
    harness.execute_sql("CREATE TABLE etiquetas (ETIQUETA TEXT);");

    let workbook = XlsxBuilder::new()
        .row(vec!["Ciudad".into(), "Pais".into()])
        .row(vec!["Cartago".into(), "CR".into()])
        .row(vec![Cell::Empty, "PA".into()])
        .build();
    let source = harness.write_input("lugares.xlsx", &workbook);
    let definition = JobBuilder::new("lugares", FileType::Excel, source.to_str().unwrap())
        .task(TaskBuilder::transformation("armar", 1).step_with(
            "CONCATENATE",
            "columns: [Ciudad, Pais]\nseparator: \"/\"\ntargetColumn: Etiqueta\n",
        ))
        .task(TaskBuilder::persistence("carga", 2).step_with(
            "INSERT",
            "tableName: etiquetas\nmappings:\n  - dbColumn: ETIQUETA\n    excelColumn: Etiqueta\n",
        ))
        .build();
    harness.write_job("lugares.yml", &definition);

    let report = harness.service().execute(&ExecuteCommand::from_scheduler());

    assert_eq!(report.status, Status::Success);
    assert_eq!(
        harness.query("SELECT ETIQUETA FROM etiquetas ORDER BY ETIQUETA"),
        vec![vec![json!("Cartago/CR")], vec![json!("PA")]]
    );
}

#[test]
fn test_headerless_sheet_maps_generated_columns() {
    let harness = TestHarness::new();
    harness.execute_sql("CREATE TABLE lecturas (COLUMN_0 INTEGER, COLUMN_1 TEXT);");

    let workbook = XlsxBuilder::new()
        .row(vec![1.into(), "norte".into()])
        .row(vec![2.into(), "sur".into()])
        .build();
    let source = harness.write_input("lecturas.xlsx", &workbook);
    let definition = JobBuilder::new("lecturas", FileType::Excel, source.to_str().unwrap())
        .task(TaskBuilder::persistence("carga", 1).step_with("INSERT", "tableName: lecturas"))
        .build();
    harness.write_job("lecturas.yml", &definition);

    let report = harness.service().execute(&ExecuteCommand::from_scheduler());

    assert_eq!(report.status, Status::Success);
    assert_eq!(
        harness.query("SELECT COLUMN_0, COLUMN_1 FROM lecturas ORDER BY COLUMN_0"),
        vec![vec![json!(1), json!("norte")], vec![json!(2), json!("sur")]]
    );
}

#[test]
fn test_stop_on_failure_halts_job() {
    let harness = TestHarness::new();
    let source = harness.write_input("clientes.xlsx", &clientes_workbook());
    let definition = JobBuilder::new("roto", FileType::Excel, source.to_str().unwrap())
        .task(missing_table_task(1).stop_on_failure())
        .task(TaskBuilder::transformation("limpieza", 2).step("TRIM"))
        .build();
    harness.write_job("roto.yml", &definition);

    let report = harness.service().execute(&ExecuteCommand::from_scheduler());

    assert_eq!(report.status, Status::Failed);
    let job = &report.jobs[0];
    assert_eq!(job.status, Status::Failed);
    assert_eq!(job.tasks[0].status, Status::Failed);
    assert_eq!(job.tasks[1].status, Status::Pending);
    assert_eq!(job.records_failed, 2);
    assert!(report
        .errors
        .iter()
        .any(|e| e.message.contains("Halting job")));
    assert!(report
        .errors
        .iter()
        .any(|e| e.message.starts_with("Task 'carga-rota' failed")));
}

#[test]
fn test_failed_task_without_stop_gives_partial_job() {
    let harness = TestHarness::new();
    harness.execute_sql(CLIENTES_TABLE);
    let definition = clientes_job(&harness, "parcial")
        .task(missing_table_task(2))
        .build();
    harness.write_job("parcial.yml", &definition);

    let report = harness.service().execute(&ExecuteCommand::from_scheduler());

    let job = &report.jobs[0];
    assert_eq!(job.status, Status::Partial);
    assert_eq!(job.records_processed, 2);
    assert_eq!(job.records_failed, 2);
    assert_eq!(report.status, Status::Partial);
    assert_eq!(harness.query("SELECT COUNT(*) FROM clientes"), vec![vec![json!(2)]]);

    let failed_step = &job.tasks[1].steps[0];
    assert_eq!(failed_step.status, Status::Failed);
    assert_eq!(failed_step.error_count, 1);
}

#[test]
fn test_batch_with_unpreparable_jobs() {
    let harness = TestHarness::new();
    harness.execute_sql(CLIENTES_TABLE);

    harness.write_job("a_ok.yml", &clientes_job(&harness, "ok").build());
    let missing = harness.input_dir.join("no-such-file.xlsx");
    harness.write_job(
        "b_missing.yml",
        &JobBuilder::new("sin-archivo", FileType::Excel, missing.to_str().unwrap()).build(),
    );
    harness.write_job(
        "c_sharepoint.yml",
        &JobBuilder::new("remoto", FileType::Excel, "https://tenant.example/sites/x.xlsx")
            .source_type(SourceType::Sharepoint)
            .build(),
    );
    harness.write_job(
        "d_disabled.yml",
        &clientes_job(&harness, "apagado").enabled(false).build(),
    );
    harness.write_job_yaml("e_broken.yml", "name: [unclosed");

    let report = harness.service().execute(&ExecuteCommand::from_scheduler());

    let names: Vec<&str> = report.jobs.iter().map(|j| j.name.as_str()).collect();
    assert_eq!(names, vec!["ok", "sin-archivo", "remoto"]);
    assert_eq!(report.status, Status::Partial);
    assert_eq!(report.totals.total_jobs, 3);
    assert_eq!(report.totals.successful_jobs, 1);
    assert_eq!(report.totals.failed_jobs, 2);
    assert!((report.totals.overall_success_rate - 33.333).abs() < 0.01);

    assert!(report.jobs[1].tasks.is_empty());
    assert_eq!(report.errors.len(), 2);
    assert!(report
        .errors
        .iter()
        .all(|e| e.message.starts_with("Failed to prepare job")));
    assert!(report.errors[1]
        .message
        .contains("No downloader available for source type SHAREPOINT"));
}

#[test]
fn test_manual_filter_runs_only_named_jobs() {
    let harness = TestHarness::new();
    harness.execute_sql(CLIENTES_TABLE);
    harness.write_job("alpha.yml", &clientes_job(&harness, "alpha").build());
    harness.write_job("beta.yml", &clientes_job(&harness, "beta").build());

    let report = harness
        .service()
        .execute(&ExecuteCommand::manual(vec!["beta".to_string()]));

    assert_eq!(report.jobs.len(), 1);
    assert_eq!(report.jobs[0].name, "beta");
    assert!(report.manually_triggered);
}

#[test]
fn test_successful_jobs_are_archived() {
    let harness = TestHarness::new();
    harness.execute_sql(CLIENTES_TABLE);
    let archive = harness.archive_dir.to_str().unwrap().to_string();
    harness.write_job(
        "ok.yml",
        &clientes_job(&harness, "ok").archive_to(&archive).build(),
    );

    harness.service().execute(&ExecuteCommand::from_scheduler());

    let archived = harness.archived_files();
    assert_eq!(archived.len(), 1);
    assert!(archived[0]
        .file_name()
        .unwrap()
        .to_str()
        .unwrap()
        .ends_with("_clientes.xlsx"));
    assert!(harness.working_files().is_empty());
}

#[test]
fn test_failed_jobs_are_not_archived() {
    let harness = TestHarness::new();
    let archive = harness.archive_dir.to_str().unwrap().to_string();
    let source = harness.write_input("clientes.xlsx", &clientes_workbook());
    harness.write_job(
        "roto.yml",
        &JobBuilder::new("roto", FileType::Excel, source.to_str().unwrap())
            .archive_to(&archive)
            .task(missing_table_task(1))
            .build(),
    );

    let report = harness.service().execute(&ExecuteCommand::from_scheduler());

    assert_eq!(report.status, Status::Failed);
    assert!(harness.archived_files().is_empty());
}

#[test]
fn test_report_is_stored() {
    let harness = TestHarness::new();
    let service = harness.service();

    let first = service.execute(&ExecuteCommand::from_scheduler());
    let second = service.execute(&ExecuteCommand::from_scheduler());

    assert_eq!(service.store().len().unwrap(), 2);
    assert_eq!(service.store().latest().unwrap().unwrap().id, second.id);
    assert!(service.store().find_by_id(first.id).unwrap().is_some());
}

#[test]
fn test_empty_jobs_directory_reports_success() {
    let harness = TestHarness::new();
    std::fs::remove_dir(&harness.jobs_dir).unwrap();

    let report = harness.service().execute(&ExecuteCommand::from_scheduler());

    assert_eq!(report.status, Status::Success);
    assert!(report.jobs.is_empty());
    assert_eq!(report.totals.overall_success_rate, 0.0);
}
