//! File exporters for the error report and the balance export.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::Serialize;
use tracing::info;

use crate::{Error, error::io_error};

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// Writes a sequence of rows to a named destination and returns where they ended up.
pub trait Exporter {
    fn write<T: Serialize>(&self, rows: &[T], destination: &str) -> Result<PathBuf, Error>;
}

impl<E: Exporter + ?Sized> Exporter for &E {
    fn write<T: Serialize>(&self, rows: &[T], destination: &str) -> Result<PathBuf, Error> {
        (**self).write(rows, destination)
    }
}

/// Pretty-printed JSON array, one object per row.
#[derive(Debug, Clone)]
pub struct JsonExporter {
    dir: PathBuf,
}

impl JsonExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Exporter for JsonExporter {
    fn write<T: Serialize>(&self, rows: &[T], destination: &str) -> Result<PathBuf, Error> {
        let path = self.dir.join(destination);
        let file = File::create(&path).map_err(|e| io_error(&path, e))?;

        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, rows)?;
        writer.write_all(b"\n").map_err(|e| io_error(&path, e))?;
        writer.flush().map_err(|e| io_error(&path, e))?;

        info!(path = %path.display(), rows = rows.len(), "wrote JSON file");
        Ok(path)
    }
}

/// Indented XML document with a `<records>` root and one `<record>` element per row.
#[derive(Debug, Clone)]
pub struct XmlExporter {
    dir: PathBuf,
}

impl XmlExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[derive(Serialize)]
#[serde(rename = "records")]
struct XmlDocument<'a, T> {
    record: &'a [T],
}

impl Exporter for XmlExporter {
    fn write<T: Serialize>(&self, rows: &[T], destination: &str) -> Result<PathBuf, Error> {
        let path = self.dir.join(destination);

        let mut body = String::from(XML_DECLARATION);
        let mut serializer = quick_xml::se::Serializer::new(&mut body);
        serializer.indent(' ', 2);
        XmlDocument { record: rows }
            .serialize(serializer)
            .map_err(|e| Error::Xml(e.to_string()))?;
        body.push('\n');

        std::fs::write(&path, body).map_err(|e| io_error(&path, e))?;

        info!(path = %path.display(), rows = rows.len(), "wrote XML file");
        Ok(path)
    }
}
