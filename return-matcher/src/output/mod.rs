pub mod csv_writer;
pub mod matfile;

pub use csv_writer::{output_path, write_values_csv};
pub use matfile::write_mat;
