//! CSV export of the duplicate-merge audit trail.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Utc;
use ftk_repair::MergeAuditRow;
use ftk_repair::modify::AuditRowKind;

use crate::error::Result;

const COLUMNS: &str =
    "group,kind,element_id,node_ids,property_id,property_type,dims,area,izz,iyy,torsion,note";

/// Writes one line per audit row below a timestamped comment header.
pub fn write_merge_audit_csv(path: impl AsRef<Path>, rows: &[MergeAuditRow]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let mut out = BufWriter::new(File::create(path)?);
    write_merge_audit(&mut out, rows)?;
    out.flush()?;
    Ok(())
}

pub fn write_merge_audit(out: &mut impl Write, rows: &[MergeAuditRow]) -> Result<()> {
    writeln!(
        out,
        "# duplicate merge audit, generated {}",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(out, "{COLUMNS}")?;
    for row in rows {
        writeln!(out, "{}", format_row(row))?;
    }
    Ok(())
}

fn format_row(row: &MergeAuditRow) -> String {
    let kind = match row.kind {
        AuditRowKind::Source => "source",
        AuditRowKind::Summary => "summary",
    };
    let element = row.element_id.map(|id| id.to_string()).unwrap_or_default();
    let nodes = join(row.node_ids.iter());
    let dims = join(row.dims.iter());
    let s = &row.section;
    [
        row.group.to_string(),
        kind.to_string(),
        element,
        nodes,
        row.property_id.to_string(),
        escape_csv(&row.property_type),
        dims,
        s.area.to_string(),
        s.izz.to_string(),
        s.iyy.to_string(),
        s.torsion.to_string(),
        escape_csv(&row.note),
    ]
    .join(",")
}

/// Space-separated so lists stay inside one column.
fn join<T: ToString>(values: impl Iterator<Item = T>) -> String {
    values.map(|v| v.to_string()).collect::<Vec<_>>().join(" ")
}

fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ftk_model::SectionValues;

    fn row(kind: AuditRowKind, element_id: Option<i32>, note: &str) -> MergeAuditRow {
        MergeAuditRow {
            group: 1,
            kind,
            node_ids: vec![1, 2],
            element_id,
            property_id: 4,
            property_type: "PBEAM".to_string(),
            dims: vec![10.0, 100.0, 50.0, 5.0],
            section: SectionValues {
                area: 10.0,
                izz: 100.0,
                iyy: 50.0,
                torsion: 5.0,
            },
            note: note.to_string(),
        }
    }

    #[test]
    fn writes_header_and_one_line_per_row() {
        let rows = vec![
            row(AuditRowKind::Source, Some(3), ""),
            row(AuditRowKind::Summary, None, "merged 3+8, new pid"),
        ];
        let mut buf = Vec::new();
        write_merge_audit(&mut buf, &rows).expect("write to memory");
        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("# duplicate merge audit, generated "));
        assert_eq!(lines[1], COLUMNS);
        assert_eq!(lines[2], "1,source,3,1 2,4,PBEAM,10 100 50 5,10,100,50,5,");
        assert!(lines[3].starts_with("1,summary,,1 2,"));
        assert!(lines[3].ends_with(",\"merged 3+8, new pid\""));
    }

    #[test]
    fn escape_csv_quotes_only_when_needed() {
        assert_eq!(escape_csv("PBEAM"), "PBEAM");
        assert_eq!(escape_csv("a,b"), "\"a,b\"");
        assert_eq!(escape_csv("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("reports").join("audit.csv");
        write_merge_audit_csv(&path, &[row(AuditRowKind::Source, Some(1), "")])
            .expect("write audit");
        let text = fs::read_to_string(&path).expect("read back");
        assert_eq!(text.lines().count(), 3);
    }
}
