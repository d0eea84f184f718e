//! File group assembly
//!
//! The listing collaborator supplies a flat stream of entities; this
//! turns it into the atomic units the pipeline validates. The
//! clinical sample and patient files for a center merge into one
//! two-entity group; everything else validates alone. VCF entities
//! are excluded outside VCF processing runs (there are often too many
//! to revalidate every run).

use crate::types::{FileEntity, FileGroup, ProcessingMode};
use tracing::info;

/// Names of the clinical pair for a center, in group order
fn clinical_pair_names(center: &str) -> [String; 2] {
    [
        format!("data_clinical_supp_sample_{}.txt", center),
        format!("data_clinical_supp_patient_{}.txt", center),
    ]
}

/// Group a center's entities into validation units
pub fn group_center_files(
    entities: Vec<FileEntity>,
    center: &str,
    processing: ProcessingMode,
) -> Vec<FileGroup> {
    info!(center = %center, files = entities.len(), "Grouping center input files");
    let pair_names = clinical_pair_names(center);

    let mut clinical_pair: Vec<FileEntity> = Vec::new();
    let mut groups: Vec<FileGroup> = Vec::new();

    for entity in entities {
        if entity.name.ends_with(".vcf") && processing != ProcessingMode::Vcf {
            continue;
        }
        if pair_names.contains(&entity.name) {
            clinical_pair.push(entity);
            continue;
        }
        groups.push(FileGroup::new(vec![entity]));
    }

    if !clinical_pair.is_empty() {
        groups.push(FileGroup::new(clinical_pair));
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entity(id: &str, name: &str) -> FileEntity {
        FileEntity {
            id: id.to_string(),
            name: name.to_string(),
            path: format!("/input/{}", name),
            content_hash: "hash".to_string(),
            modified_on: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            modified_by: "user-1".to_string(),
            created_by: "user-2".to_string(),
            center: "SAGE".to_string(),
        }
    }

    #[test]
    fn test_clinical_pair_grouped_together() {
        let groups = group_center_files(
            vec![
                entity("1", "data_cna_SAGE.txt"),
                entity("2", "data_clinical_supp_sample_SAGE.txt"),
                entity("3", "data_clinical_supp_patient_SAGE.txt"),
            ],
            "SAGE",
            ProcessingMode::Main,
        );

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 1);
        // Pair group comes last, in arrival order
        assert_eq!(groups[1].len(), 2);
        assert_eq!(
            groups[1].names(),
            vec![
                "data_clinical_supp_sample_SAGE.txt",
                "data_clinical_supp_patient_SAGE.txt"
            ]
        );
    }

    #[test]
    fn test_lone_clinical_file_still_grouped() {
        let groups = group_center_files(
            vec![entity("1", "data_clinical_supp_sample_SAGE.txt")],
            "SAGE",
            ProcessingMode::Main,
        );
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 1);
    }

    #[test]
    fn test_vcf_excluded_outside_vcf_mode() {
        let groups = group_center_files(
            vec![entity("1", "sample.vcf"), entity("2", "data_cna_SAGE.txt")],
            "SAGE",
            ProcessingMode::Main,
        );
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].names(), vec!["data_cna_SAGE.txt"]);
    }

    #[test]
    fn test_vcf_included_in_vcf_mode() {
        let groups = group_center_files(
            vec![entity("1", "sample.vcf")],
            "SAGE",
            ProcessingMode::Vcf,
        );
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn test_other_center_pair_names_not_merged() {
        let groups = group_center_files(
            vec![
                entity("1", "data_clinical_supp_sample_OTHER.txt"),
                entity("2", "data_clinical_supp_patient_OTHER.txt"),
            ],
            "SAGE",
            ProcessingMode::Main,
        );
        // Names do not match this center's pair, so they stay
        // singleton groups (and will trip the clinical-count policy
        // downstream if excessive).
        assert_eq!(groups.len(), 2);
    }
}
