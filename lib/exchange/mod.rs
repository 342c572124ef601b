//! Rendering a `Project` into the exchange document.
//!
//! The document is JSON. Identifiers are opaque strings, addresses and
//! constants are `0x`-prefixed hex text, and optional values are always
//! written out, as `null` or `"unknown"`, never omitted.
//!
//! Serialization is a pure function of the `Project`, so extracting the same
//! input twice yields byte-identical documents.

pub mod document;

use crate::il::Project;
use crate::Error;
use log::info;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Build the exchange document of a `Project`.
pub fn to_document(project: &Project) -> document::Project {
    project.into()
}

/// Render a `Project` as JSON text.
pub fn to_json(project: &Project, pretty: bool) -> Result<String, Error> {
    let document = to_document(project);
    Ok(if pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    })
}

/// Write the JSON of a `Project` to `writer`.
pub fn write<W: Write>(project: &Project, writer: W, pretty: bool) -> Result<(), Error> {
    let document = to_document(project);
    let mut writer = BufWriter::new(writer);
    if pretty {
        serde_json::to_writer_pretty(&mut writer, &document)?;
    } else {
        serde_json::to_writer(&mut writer, &document)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the JSON of a `Project` to the file at `path`.
///
/// The document is written to a temporary file next to `path`, which then
/// replaces `path`. Readers of `path` see either the old file, or the whole
/// document.
pub fn write_file(project: &Project, path: &Path, pretty: bool) -> Result<(), Error> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(directory)?;
    write(project, file.as_file_mut(), pretty)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| Error::Io(e.error))?;
    info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::Extractor;
    use crate::loader::RawProgram;
    use crate::platform;
    use serde_json::Value;

    const DOCUMENT: &str = r#"{
        "cpu_architecture": "x86_64",
        "image_base": "0x400000",
        "entry_points": ["0x1000"],
        "functions": [
            { "name": "main", "address": "0x1000", "operations": [
                { "address": "0x1000", "mnemonic": "CALLIND",
                  "inputs": [{ "kind": "register", "name": "RAX", "bits": 64 }] },
                { "address": "0x1004", "mnemonic": "RETURN" }
            ] }
        ],
        "extern_symbols": [
            { "name": "abort", "addresses": ["0x5000"], "no_return": true,
              "calling_convention": "__pascal" }
        ]
    }"#;

    fn document() -> Value {
        let profile = platform::lookup("x86_64").unwrap();
        let raw = RawProgram::from_json(DOCUMENT).unwrap();
        let project = Extractor::new(&profile).extract(&raw).unwrap();
        serde_json::from_str(&to_json(&project, false).unwrap()).unwrap()
    }

    #[test]
    fn document_root() {
        let document = document();
        assert_eq!(document["cpu_architecture"], "x86_64");
        assert_eq!(document["program"]["tid"], "prog_00400000");
        assert_eq!(document["program"]["term"]["image_base"], "0x400000");
        assert_eq!(
            document["stack_pointer_register"]["resolved"]["name"],
            "RSP"
        );
        assert!(document["register_properties"].is_array());
        assert!(document["register_calling_convention"].is_array());
    }

    #[test]
    fn optional_values_are_never_omitted() {
        let document = document();
        let program = &document["program"]["term"];
        let call = &program["subs"][0]["term"]["blocks"][0]["term"]["jmps"][0]["term"]["Call"];
        assert_eq!(call["target"]["Indirect"]["hint"], Value::Null);
        assert!(call["target"]["Indirect"].get("hint").is_some());
        assert!(call["return"].is_string());

        let ret = &program["subs"][0]["term"]["blocks"][1]["term"]["jmps"][0]["term"];
        assert_eq!(ret["Return"], Value::Null);
        assert!(ret.get("Return").is_some());

        let abort = &program["extern_symbols"][0];
        assert_eq!(abort["calling_convention"], "unknown");
        assert_eq!(abort["no_return"], true);
    }

    #[test]
    fn missing_platform_data_is_written_as_unknown() {
        let profile = platform::PlatformProfile::from_json(
            r#"{ "cpu_architecture": "bare", "endian": "little", "word_size": 32 }"#,
        )
        .unwrap();
        let raw = RawProgram::from_json(&DOCUMENT.replace("x86_64", "bare")).unwrap();
        let project = Extractor::new(&profile).extract(&raw).unwrap();
        let document: Value = serde_json::from_str(&to_json(&project, false).unwrap()).unwrap();

        assert_eq!(document["stack_pointer_register"], "unknown");
        let symbol = &document["program"]["term"]["extern_symbols"][0];
        assert_eq!(symbol["calling_convention"], "unknown");
    }

    #[test]
    fn files_are_replaced_whole() {
        let profile = platform::lookup("x86_64").unwrap();
        let raw = RawProgram::from_json(DOCUMENT).unwrap();
        let project = Extractor::new(&profile).extract(&raw).unwrap();

        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("project.json");
        std::fs::write(&path, "stale").unwrap();
        write_file(&project, &path, true).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, to_json(&project, true).unwrap());
        assert_eq!(std::fs::read_dir(directory.path()).unwrap().count(), 1);
    }
}
