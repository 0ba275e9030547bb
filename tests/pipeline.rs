use anyhow::Result;
use arrow::{array::AsArray, datatypes::Float64Type};
use pltpipe::{
    batch::{self, FileStatus},
    config::PipelineConfig,
    table::parquet::read_batch,
};
use std::{fs, path::Path};
use tempfile::tempdir;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn init_test_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn config_in(root: &Path, hz: f64) -> PipelineConfig {
    let mut cfg = PipelineConfig {
        target_frequency_hz: hz,
        max_workers: 2,
        ..Default::default()
    };
    cfg.dirs.raw = root.join("data_raw");
    cfg.dirs.renamed = root.join("data_renamed");
    cfg.dirs.parquet = root.join("data_parquet");
    cfg.dirs.resampled = root.join("data_parquet_resampled");
    cfg.mapping.path = root.join("header_mapping.csv");
    cfg
}

#[tokio::test]
async fn raw_dumps_end_up_resampled() -> Result<()> {
    init_test_logging();
    let tmp = tempdir()?;
    let cfg = config_in(tmp.path(), 2.0);

    fs::write(
        &cfg.mapping.path,
        "Nome Atual,Nome Atualizado\nVEL,speed\nPOS , position\n",
    )?;
    fs::create_dir_all(&cfg.dirs.raw)?;
    fs::write(
        cfg.dirs.raw.join("run1.plt"),
        "3\nTempo\nVEL\r\nPOS\n0 1 10\n0.5 2 20\n1.0 3\n30\n",
    )?;
    // decodes fine but has no time column for the resampler
    fs::write(cfg.dirs.raw.join("notime.plt"), "2\nt\nVEL\n0 1\n1 2\n")?;
    fs::write(cfg.dirs.raw.join("broken.plt"), "abc\nTempo\n")?;

    let summaries = batch::run_pipeline(&cfg).await?;
    let counts: Vec<(usize, usize, usize)> = summaries
        .iter()
        .map(|s| (s.converted, s.skipped, s.failed))
        .collect();
    assert_eq!(counts, vec![(2, 1, 0), (2, 0, 0), (1, 1, 0)]);

    // headers rewritten, payload untouched
    let renamed = fs::read_to_string(cfg.dirs.renamed.join("run1.plt"))?;
    assert_eq!(
        renamed,
        "3\nTempo\nspeed\nposition\n0 1 10\n0.5 2 20\n1.0 3\n30\n"
    );

    let decoded = read_batch(&cfg.dirs.parquet.join("run1.parquet"))?;
    assert_eq!(decoded.num_rows(), 3);
    assert_eq!(decoded.num_columns(), 3);

    let resampled = read_batch(&cfg.dirs.resampled.join("run1.parquet"))?;
    let names: Vec<String> = resampled
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    assert_eq!(names, vec!["Tempo", "speed", "position"]);
    let time: Vec<f64> = resampled
        .column(0)
        .as_primitive::<Float64Type>()
        .values()
        .to_vec();
    assert_eq!(time, vec![0.0, 0.5, 1.0]);
    let position: Vec<f64> = resampled
        .column(2)
        .as_primitive::<Float64Type>()
        .values()
        .to_vec();
    assert_eq!(position, vec![10.0, 20.0, 30.0]);

    assert!(!cfg.dirs.resampled.join("notime.parquet").exists());
    match &summaries[2].outcomes[0].status {
        FileStatus::Skipped { reason } => assert!(reason.contains("tempo")),
        other => panic!("unexpected {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn report_lists_every_stage() -> Result<()> {
    let tmp = tempdir()?;
    let cfg = config_in(tmp.path(), 120.0);
    fs::write(&cfg.mapping.path, "Nome Atual,Nome Atualizado\n")?;
    fs::create_dir_all(&cfg.dirs.raw)?;
    fs::write(cfg.dirs.raw.join("a.plt"), "2\ntempo\nx\n0 0\n1 120\n")?;

    let summaries = batch::run_pipeline(&cfg).await?;
    let report = tmp.path().join("report.json");
    batch::write_report(&report, &summaries)?;

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report)?)?;
    let stages: Vec<&str> = value
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|s| s["stage"].as_str())
        .collect();
    assert_eq!(stages, vec!["rename", "decode", "resample"]);
    assert_eq!(value[2]["outcomes"][0]["rows"], 121);
    Ok(())
}

#[tokio::test]
async fn missing_raw_dir_stops_the_pipeline() -> Result<()> {
    let tmp = tempdir()?;
    let cfg = config_in(tmp.path(), 120.0);
    fs::write(&cfg.mapping.path, "Nome Atual,Nome Atualizado\n")?;
    assert!(batch::run_pipeline(&cfg).await.is_err());
    assert!(!cfg.dirs.parquet.exists());
    Ok(())
}
