use csv::Writer;
use std::fs::File;
use std::io::{self, Write};

/// Saves sampled function and derivative curves as a tab-separated table.
///
/// The first column is the argument mesh, the remaining two are f(x) and f'(x).
pub fn save_curves_to_file(
    x_mesh: &[f64],
    y: &[f64],
    dy: &[f64],
    filename: &str,
    arg: &str,
) -> io::Result<()> {
    let mut file = File::create(filename)?;
    writeln!(file, "{}\tf\tdf", arg)?;
    for i in 0..x_mesh.len() {
        writeln!(file, "{}\t{}\t{}", x_mesh[i], y[i], dy[i])?;
    }

    Ok(())
}

pub fn save_curves_to_csv(
    x_mesh: &[f64],
    y: &[f64],
    dy: &[f64],
    filename: &str,
    arg: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::create(filename)?;
    let mut writer = Writer::from_writer(file);

    // Write headers
    writer.write_record([arg, "f", "df"])?;

    // Write data rows
    for i in 0..x_mesh.len() {
        writer.write_record([
            x_mesh[i].to_string(),
            y[i].to_string(),
            dy[i].to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_curves_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curves.txt");
        let path = path.to_str().unwrap();
        save_curves_to_file(&[0.0, 1.0], &[1.0, 2.0], &[0.5, 0.5], path, "x").unwrap();
        let contents = std::fs::read_to_string(path).unwrap();
        assert!(contents.starts_with("x\tf\tdf"));
        assert!(contents.contains("1\t2\t0.5"));
    }

    #[test]
    fn test_save_curves_to_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curves.csv");
        let path = path.to_str().unwrap();
        save_curves_to_csv(&[0.0, 1.0], &[1.0, 2.0], &[0.5, 0.5], path, "x").unwrap();
        let contents = std::fs::read_to_string(path).unwrap();
        assert!(contents.starts_with("x,f,df"));
        assert_eq!(contents.lines().count(), 3);
    }
}
