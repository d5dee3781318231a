//! Byte stream adapters.
//!
//! Converts between raw multi-document YAML text and document
//! sequences. The reader stamps each document with its ordinal in the
//! stream; the writer strips that ordinal again unless the caller wants
//! to keep reader annotations.

use crate::constants::INDEX_ANNOTATION;
use crate::document::{parse_documents, Document};
use crate::error::Result;
use std::io::{Read, Write};

/// Reads a multi-document YAML stream into documents.
pub struct ByteReader<R: Read> {
    reader: R,
    /// Skip assigning index annotations while reading.
    pub omit_reader_annotations: bool,
}

impl<R: Read> ByteReader<R> {
    /// Creates a reader over a raw byte source.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            omit_reader_annotations: false,
        }
    }

    /// Reads every document in the stream, in order. Unless
    /// [`omit_reader_annotations`](Self::omit_reader_annotations) is
    /// set, each document's index annotation is set to its position.
    pub fn read(mut self) -> Result<Vec<Document>> {
        let mut text = String::new();
        self.reader.read_to_string(&mut text)?;
        let mut documents = parse_documents(&text)?;
        if !self.omit_reader_annotations {
            for (i, doc) in documents.iter_mut().enumerate() {
                doc.set_annotation(INDEX_ANNOTATION, i.to_string());
            }
        }
        Ok(documents)
    }
}

/// Writes documents as a `---`-separated YAML stream.
pub struct ByteWriter<W: Write> {
    writer: W,
    /// Keep the transient index annotation on emitted documents.
    pub keep_reader_annotations: bool,
}

impl<W: Write> ByteWriter<W> {
    /// Creates a writer over a raw byte sink.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            keep_reader_annotations: false,
        }
    }

    /// Writes every document, separated by `---` lines. Unless
    /// [`keep_reader_annotations`](Self::keep_reader_annotations) is
    /// set, the index annotation is stripped before emission.
    pub fn write(mut self, documents: &[Document]) -> Result<()> {
        for (i, doc) in documents.iter().enumerate() {
            let mut doc = doc.clone();
            if !self.keep_reader_annotations {
                doc.remove_annotation(INDEX_ANNOTATION);
            }
            if i > 0 {
                self.writer.write_all(b"---\n")?;
            }
            self.writer.write_all(doc.to_yaml()?.as_bytes())?;
        }
        Ok(())
    }
}
