//! Merges elements sharing the same node set into one equivalent beam.

use ftk_model::{FeModel, MERGED_FROM, Property, PropertyKind, SectionValues};
use serde::Serialize;

use crate::error::Result;
use crate::log::{LogFn, LogSink};

#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateMergeOptions {
    /// Material used when the first member's property cannot be resolved
    pub fallback_material_id: i32,
    pub debug: bool,
    pub dry_run: bool,
}

impl Default for DuplicateMergeOptions {
    fn default() -> Self {
        Self {
            fallback_material_id: 1,
            debug: false,
            dry_run: false,
        }
    }
}

impl DuplicateMergeOptions {
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuditRowKind {
    /// One member before the merge
    Source,
    /// The merged result of a group
    Summary,
}

/// One line of the merge audit trail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeAuditRow {
    pub group: usize,
    pub kind: AuditRowKind,
    pub node_ids: Vec<i32>,
    /// `None` on summary rows
    pub element_id: Option<i32>,
    pub property_id: i32,
    pub property_type: String,
    pub dims: Vec<f64>,
    pub section: SectionValues,
    pub note: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DuplicateMergeReport {
    pub groups_found: usize,
    /// Members folded into their group's survivor
    pub elements_merged: usize,
    pub new_properties_created: usize,
    pub audit: Vec<MergeAuditRow>,
}

/// Merges every duplicate group. The first listed member survives under a
/// deduplicated `EQUIV_PBEAM` property whose `[A, Izz, Iyy, J]` is the sum
/// over the group; the others are deleted.
pub fn run(
    model: &mut FeModel,
    groups: &[Vec<i32>],
    opt: &DuplicateMergeOptions,
    log: LogFn<'_>,
) -> Result<DuplicateMergeReport> {
    let mut log = LogSink::new(log);
    let mut report = DuplicateMergeReport::default();

    for (gi, group) in groups.iter().enumerate() {
        let members: Vec<i32> = group
            .iter()
            .copied()
            .filter(|eid| model.elements.contains(*eid))
            .collect();
        if members.len() < 2 {
            continue;
        }
        report.groups_found += 1;
        let group_no = gi + 1;

        let mut total = SectionValues::default();
        for &eid in &members {
            let element = model.elements.get(eid)?;
            let pid = element.property_id();
            let node_ids = element.node_ids().to_vec();
            let (kind, dims, section, note) = match model.properties.get(pid) {
                Ok(prop) => match prop.section() {
                    Some(values) => (prop.kind().to_string(), prop.dims().to_vec(), values, String::new()),
                    None => {
                        log.warn(&format!(
                            "  group {group_no}: property {pid} ({}) has too few dimensions, counted as zero",
                            prop.kind()
                        ));
                        (
                            prop.kind().to_string(),
                            prop.dims().to_vec(),
                            SectionValues::default(),
                            "insufficient dimensions".to_string(),
                        )
                    }
                },
                Err(e) => {
                    log.warn(&format!("  group {group_no}: {e}, counted as zero"));
                    (String::new(), Vec::new(), SectionValues::default(), "property missing".to_string())
                }
            };
            total = total + section;
            report.audit.push(MergeAuditRow {
                group: group_no,
                kind: AuditRowKind::Source,
                node_ids,
                element_id: Some(eid),
                property_id: pid,
                property_type: kind,
                dims,
                section,
                note,
            });
        }

        let survivor = members[0];
        let first = model.elements.get(survivor)?.clone();
        let material_id = model
            .properties
            .get(first.property_id())
            .map(|p| p.material_id())
            .unwrap_or(opt.fallback_material_id);

        let merged = match Property::new(PropertyKind::EquivPbeam, total.as_dims(), material_id) {
            Ok(p) => p,
            Err(e) => {
                log.warn(&format!("  group {group_no} skipped: {e}"));
                continue;
            }
        };
        let existing = model.properties.find(&merged);
        let pid = if opt.dry_run {
            existing.unwrap_or(-1)
        } else {
            model.properties.add_or_get(merged.clone())
        };
        if existing.is_none() {
            report.new_properties_created += 1;
        }

        let provenance = members
            .iter()
            .map(i32::to_string)
            .collect::<Vec<_>>()
            .join("+");
        report.audit.push(MergeAuditRow {
            group: group_no,
            kind: AuditRowKind::Summary,
            node_ids: first.node_ids().to_vec(),
            element_id: None,
            property_id: pid,
            property_type: PropertyKind::EquivPbeam.to_string(),
            dims: merged.dims().to_vec(),
            section: total,
            note: format!("merged into element {survivor} ({provenance})"),
        });

        if opt.debug {
            log.line(&format!(
                "  group {group_no}: [{provenance}] -> element {survivor}, A={:.4}, Izz={:.4}, Iyy={:.4}, J={:.4}",
                total.area, total.izz, total.iyy, total.torsion
            ));
        }

        report.elements_merged += members.len() - 1;
        if opt.dry_run {
            continue;
        }
        model.elements.replace(
            survivor,
            first.with_property(pid).with_extra_entry(MERGED_FROM, provenance),
        )?;
        for &eid in &members[1..] {
            model.elements.remove(eid)?;
        }
    }

    log.line(&format!(
        "Duplicate merge: groups={}, merged={}, new properties={}",
        report.groups_found, report.elements_merged, report.new_properties_created
    ));
    Ok(report)
}
