//! Loading of training and test data from csv files and saving of results in npy format.
//!
//! Csv files are comma separated with a header row which is skipped.
use crate::errors::{PollumapError, Result};
use csv::ReaderBuilder;
use ndarray::{Array1, Array2, ArrayBase, Data, Dimension};
use ndarray_csv::Array2Reader;
use ndarray_npy::{write_npy, WritableElement};
use std::fs::File;
use std::path::Path;

/// Training features file name
pub const TRAIN_FEATURES_FILE: &str = "train_x.csv";
/// Training targets file name
pub const TRAIN_TARGETS_FILE: &str = "train_y.csv";
/// Test features file name
pub const TEST_FEATURES_FILE: &str = "test_x.csv";
/// Test predictions file name
pub const PREDICTIONS_FILE: &str = "predictions.npy";

/// Load a numeric matrix with `ncols` columns from a csv file
pub fn load_csv<P: AsRef<Path>>(path: P, ncols: usize) -> Result<Array2<f64>> {
    let file = File::open(path.as_ref())?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b',')
        .from_reader(file);
    let data: Array2<f64> = reader.deserialize_array2_dynamic()?;
    if data.ncols() != ncols {
        return Err(PollumapError::ShapeMismatch(format!(
            "{} should have {} columns, got {}",
            path.as_ref().display(),
            ncols,
            data.ncols()
        )));
    }
    Ok(data)
}

/// Load (lon, lat) locations as a (n, 2) matrix
pub fn load_features<P: AsRef<Path>>(path: P) -> Result<Array2<f64>> {
    load_csv(path, 2)
}

/// Load concentrations as a (n,) vector
pub fn load_targets<P: AsRef<Path>>(path: P) -> Result<Array1<f64>> {
    let data = load_csv(path, 1)?;
    Ok(data.column(0).to_owned())
}

/// Save an array in npy format to `dir/filename`, `dir` is created if missing
pub fn save_npy<A, S, D>(dir: &Path, filename: &str, data: &ArrayBase<S, D>) -> Result<()>
where
    A: WritableElement,
    S: Data<Elem = A>,
    D: Dimension,
{
    std::fs::create_dir_all(dir)?;
    write_npy(dir.join(filename), data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use ndarray_npy::read_npy;

    fn write_csv(name: &str, content: &str) -> std::path::PathBuf {
        let dir = Path::new("target/tests/io");
        std::fs::create_dir_all(dir).expect("test dir");
        let path = dir.join(name);
        std::fs::write(&path, content).expect("csv written");
        path
    }

    #[test]
    fn test_load_features() {
        let path = write_csv("features.csv", "lon,lat\n0.1,0.2\n0.3,0.4\n0.5,0.6\n");
        let x = load_features(path).expect("features");
        assert_eq!(array![[0.1, 0.2], [0.3, 0.4], [0.5, 0.6]], x);
    }

    #[test]
    fn test_load_targets() {
        let path = write_csv("targets.csv", "pm25\n12.5\n40\n");
        let y = load_targets(path).expect("targets");
        assert_eq!(array![12.5, 40.], y);
    }

    #[test]
    fn test_wrong_column_count() {
        let path = write_csv("three_cols.csv", "a,b,c\n1,2,3\n");
        let res = load_features(&path);
        assert!(matches!(res, Err(PollumapError::ShapeMismatch(_))));
        assert!(load_targets(&path).is_err());
    }

    #[test]
    fn test_missing_file() {
        let res = load_features("target/tests/io/does_not_exist.csv");
        assert!(matches!(res, Err(PollumapError::IoError(_))));
    }

    #[test]
    fn test_save_npy() {
        let dir = Path::new("target/tests/io/npy");
        let data = array![[1., 2.], [3., 4.]];
        save_npy(dir, "data.npy", &data).expect("npy saved");
        let read: Array2<f64> = read_npy(dir.join("data.npy")).expect("npy read");
        assert_eq!(data, read);
    }
}
