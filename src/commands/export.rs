use anyhow::{Context, Result};
use orgchart::export::{default_export_filename, employee_rows, write_employee_csv};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

pub fn run(dir: &Path, output: Option<&Path>) -> Result<()> {
    let config = super::load_config(dir)?;
    let chart = super::load_chart(dir, &config.tree.build_options(), &config)?;
    let index = chart.index();

    let people = index.filtered_users("", None);
    let rows = employee_rows(&people, &index);

    let path: PathBuf = match output {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(default_export_filename(
            &config.export.filename_prefix,
            chrono::Local::now().date_naive(),
        )),
    };

    let file = File::create(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_employee_csv(BufWriter::new(file), &rows)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Exported {} people to {}", rows.len(), path.display());
    Ok(())
}
