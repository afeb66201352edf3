use crate::libs::error::MsaError;
use std::io::{BufRead, BufReader, BufWriter, Write};

/// Opens `input` for buffered reading. `stdin` reads the standard input and a
/// `.gz` extension is decompressed on the fly.
///
/// ```
/// use std::io::BufRead;
/// let reader = chainmsa::reader("tests/msa/seqs.fa").unwrap();
/// let headers = reader
///     .lines()
///     .map(|l| l.unwrap())
///     .filter(|l| l.starts_with('>'))
///     .count();
/// assert_eq!(headers, 4);
///
/// assert!(chainmsa::reader("tests/msa/not_there.fa").is_err());
/// ```
pub fn reader(input: &str) -> anyhow::Result<Box<dyn BufRead>> {
    let reader: Box<dyn BufRead> = if input == "stdin" {
        Box::new(BufReader::new(std::io::stdin()))
    } else {
        let path = std::path::Path::new(input);
        let file = std::fs::File::open(path)
            .map_err(|why| MsaError::input(input, format!("could not open: {}", why)))?;

        if path.extension() == Some(std::ffi::OsStr::new("gz")) {
            Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        }
    };

    Ok(reader)
}

/// Opens `output` for buffered writing; `stdout` writes to the screen.
pub fn writer(output: &str) -> anyhow::Result<Box<dyn Write>> {
    let writer: Box<dyn Write> = if output == "stdout" {
        Box::new(BufWriter::new(std::io::stdout()))
    } else {
        let file = std::fs::File::create(output).map_err(|why| {
            MsaError::Configuration(format!("could not create {}: {}", output, why))
        })?;
        Box::new(BufWriter::new(file))
    };

    Ok(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use tempfile::tempdir;

    #[test]
    fn test_reader_gz() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("two.fa.gz");
        {
            let file = std::fs::File::create(&path).unwrap();
            let mut encoder = GzEncoder::new(file, flate2::Compression::default());
            write!(encoder, ">a\nACGT\n>b\nACGA\n").unwrap();
            encoder.finish().unwrap();
        }

        let reader = reader(path.to_str().unwrap()).unwrap();
        let lines: Vec<String> = reader.lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec![">a", "ACGT", ">b", "ACGA"]);
    }

    #[test]
    fn test_reader_missing() {
        let err = reader("tests/msa/missing.fa").err().unwrap();
        match err.downcast_ref::<MsaError>() {
            Some(MsaError::InputAccess { path, .. }) => assert_eq!(path, "tests/msa/missing.fa"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_writer_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        {
            let mut writer = writer(path.to_str().unwrap()).unwrap();
            writeln!(writer, "hello").unwrap();
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
    }
}
