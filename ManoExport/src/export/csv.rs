//! Dialogue CSV writer
//!
//! UTF-8 with a BOM so spreadsheet programs pick the right encoding, CRLF row
//! terminators, and fields quoted only when they need it.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::script::DialogueRecord;

const BOM: &str = "\u{FEFF}";
const LINE_END: &str = "\r\n";
const DELIMITER: char = ',';

/// Column order of the output table
pub const CSV_HEADER: [&str; 6] = [
    "line_id",
    "speaker_ja",
    "speaker_zh",
    "line_ja",
    "line_zh",
    "voice_file",
];

/// Write all records to `path`, replacing any existing file
pub fn write_dialogue_csv(records: &[DialogueRecord], path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_dialogue(records, &mut writer)?;
    writer.flush()?;
    tracing::info!("[CSV] Written: {}", path.display());
    Ok(())
}

/// Serialize records (BOM and header included) to any writer
pub fn write_dialogue<W: Write>(records: &[DialogueRecord], writer: &mut W) -> Result<()> {
    writer.write_all(BOM.as_bytes())?;
    write_row(writer, &CSV_HEADER)?;
    for record in records {
        write_row(
            writer,
            &[
                &record.line_id,
                &record.speaker_ja,
                &record.speaker_zh,
                &record.line_ja,
                &record.line_zh,
                &record.voice_file,
            ],
        )?;
    }
    Ok(())
}

fn write_row<W: Write, S: AsRef<str>>(writer: &mut W, fields: &[S]) -> Result<()> {
    let row = fields
        .iter()
        .map(|f| escape_for_delimited(f.as_ref(), DELIMITER))
        .collect::<Vec<_>>()
        .join(",");
    writer.write_all(row.as_bytes())?;
    writer.write_all(LINE_END.as_bytes())?;
    Ok(())
}

/// Quote a field if it contains the delimiter, a quote or a line break
fn escape_for_delimited(text: &str, delimiter: char) -> String {
    if text.contains(delimiter) || text.contains('\n') || text.contains('\r') || text.contains('"')
    {
        let escaped = text.replace('"', "\"\"");
        format!("\"{escaped}\"")
    } else {
        text.to_string()
    }
}
