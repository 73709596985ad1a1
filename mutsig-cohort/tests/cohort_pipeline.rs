//! End-to-end cohort runs on a two-context, two-signature basis.
//!
//! Every patient has one sample carrying all of its variants. Node 0 holds
//! only A[C>A]A variants (signature 1 territory), node 1 only T[C>T]G
//! variants (signature 2 territory). Half of the C>A calls are reported on
//! the opposite strand as G>T in TGT.

use approx::assert_abs_diff_eq;
use mutsig_cohort::{cohort_signatures, run_branch_test, run_cohort, CohortConfig};
use mutsig_core::{BasisRow, BranchRole, SignatureBasis, SnvNodeRecord, SnvRecord};
use mutsig_plotting::OutputFormat;
use std::io::Write;

const N_PATIENTS: usize = 6;

fn basis() -> SignatureBasis {
    SignatureBasis::from_rows(
        vec!["Signature 1".into(), "Signature 2".into()],
        vec![
            BasisRow {
                trinucleotide: "ACA".into(),
                substitution_type: "C>A".into(),
                probabilities: vec![0.9, 0.1],
            },
            BasisRow {
                trinucleotide: "TCG".into(),
                substitution_type: "C>T".into(),
                probabilities: vec![0.1, 0.9],
            },
        ],
    )
    .unwrap()
}

/// Sample SNVs and node SNVs for the cohort, `per_node` variants per node.
fn cohort(per_node: usize) -> (Vec<SnvRecord>, Vec<SnvNodeRecord>) {
    let mut snvs = Vec::new();
    let mut nodes = Vec::new();
    for p in 0..N_PATIENTS {
        let patient = format!("P{}", p);
        for k in 0..2 * per_node {
            let coord = (p * 10_000 + k) as u64;
            let (node, ref_allele, alt_allele, context) = if k < per_node {
                if k % 2 == 0 {
                    (0, "C", "A", "ACA")
                } else {
                    (0, "G", "T", "TGT")
                }
            } else {
                (1, "C", "T", "TCG")
            };
            snvs.push(SnvRecord {
                chrom: "1".into(),
                coord,
                ref_allele: ref_allele.into(),
                alt_allele: alt_allele.into(),
                tri_nucleotide_context: Some(context.into()),
                alt_counts: 5,
                patient_id: patient.clone(),
                sample_id: "S1".into(),
            });
            nodes.push(SnvNodeRecord {
                patient_id: patient.clone(),
                node,
                chrom: "1".into(),
                coord,
                ref_allele: ref_allele.into(),
                alt_allele: alt_allele.into(),
            });
        }
    }
    (snvs, nodes)
}

#[test]
fn cohort_separates_ancestral_and_descendant_exposures() {
    let basis = basis();
    let lookup = basis.context_lookup().unwrap();
    let (snvs, nodes) = cohort(120);

    let result = cohort_signatures(&lookup, &basis, &snvs, &nodes, &CohortConfig::default())
        .unwrap();

    assert_eq!(result.samples_table.n_groups(), N_PATIENTS);
    assert_eq!(result.samples_table.keys[0].label, "P0_S1");
    assert_eq!(result.samples_table.signatures, vec!["1", "2"]);

    assert_eq!(result.node_table.n_groups(), 2 * N_PATIENTS);
    for (key, row) in result.node_table.keys.iter().zip(result.node_table.proportions.rows()) {
        assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-9);
        match key.role {
            Some(BranchRole::Ancestral) => {
                assert!(key.label.ends_with("_Node0"));
                assert!(row[0] > 0.9, "{} signature 1 = {}", key, row[0]);
            }
            Some(BranchRole::Descendant) => {
                assert!(key.label.ends_with("_Node1"));
                assert!(row[1] > 0.9, "{} signature 2 = {}", key, row[1]);
            }
            None => panic!("node key {} has no branch role", key),
        }
    }

    assert!(!result.samples_heatmap.is_empty());
    assert!(!result.node_heatmap.is_empty());
    assert_eq!(result.node_signature_boxplots.n_panels(), 2);
    let svg = result.node_signature_boxplots.to_svg().unwrap();
    assert!(svg.contains("Signature 1"));
    assert!(svg.contains("Signature 2"));
}

#[test]
fn small_nodes_leave_node_outputs_empty() {
    let basis = basis();
    let lookup = basis.context_lookup().unwrap();
    // 2 x 60 = 120 variants per sample, 60 per node
    let (snvs, nodes) = cohort(60);

    let result = cohort_signatures(&lookup, &basis, &snvs, &nodes, &CohortConfig::default())
        .unwrap();

    assert_eq!(result.samples_table.n_groups(), N_PATIENTS);
    assert!(result.node_table.is_empty());
    assert_eq!(result.node_table.n_signatures(), 2);
    assert!(result.node_heatmap.is_empty());
    assert!(result.node_signature_boxplots.is_empty());
}

#[test]
fn node_sites_missing_from_samples_are_dropped() {
    let basis = basis();
    let lookup = basis.context_lookup().unwrap();
    let (snvs, mut nodes) = cohort(120);
    nodes.push(SnvNodeRecord {
        patient_id: "P0".into(),
        node: 2,
        chrom: "2".into(),
        coord: 1,
        ref_allele: "C".into(),
        alt_allele: "A".into(),
    });

    let result = cohort_signatures(&lookup, &basis, &snvs, &nodes, &CohortConfig::default())
        .unwrap();
    assert!(result
        .node_table
        .keys
        .iter()
        .all(|k| k.label != "P0_Node2"));
}

#[test]
fn run_cohort_writes_all_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let (snvs, nodes) = cohort(120);

    let sig_path = dir.path().join("signatures.tsv");
    let mut f = std::fs::File::create(&sig_path).unwrap();
    writeln!(f, "Substitution Type\tTrinucleotide\tSignature 1\tSignature 2").unwrap();
    writeln!(f, "C>A\tACA\t0.9\t0.1").unwrap();
    writeln!(f, "C>T\tTCG\t0.1\t0.9").unwrap();

    let snv_path = dir.path().join("snvs.csv");
    let mut f = std::fs::File::create(&snv_path).unwrap();
    writeln!(
        f,
        "chrom,coord,ref,alt,tri_nucleotide_context,alt_counts,patient_id,sample_id"
    )
    .unwrap();
    for s in &snvs {
        writeln!(
            f,
            "{},{},{},{},{},{},{},{}",
            s.chrom,
            s.coord,
            s.ref_allele,
            s.alt_allele,
            s.tri_nucleotide_context.as_deref().unwrap_or("NA"),
            s.alt_counts,
            s.patient_id,
            s.sample_id
        )
        .unwrap();
    }

    let node_path = dir.path().join("snv_nodes.tsv");
    let mut f = std::fs::File::create(&node_path).unwrap();
    writeln!(f, "patient_id\tnode\tchrom\tcoord\tref\talt").unwrap();
    for n in &nodes {
        writeln!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}",
            n.patient_id, n.node, n.chrom, n.coord, n.ref_allele, n.alt_allele
        )
        .unwrap();
    }

    let out_dir = dir.path().join("out");
    let written = run_cohort(
        &sig_path,
        &snv_path,
        &node_path,
        &out_dir,
        OutputFormat::Svg,
        &CohortConfig::default(),
    )
    .unwrap();

    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "samples_table.tsv",
            "samples_heatmap.svg",
            "node_table.tsv",
            "node_heatmap.svg",
            "node_signature_boxplots.svg",
        ]
    );
    for path in &written {
        assert!(path.exists(), "{} missing", path.display());
    }

    let node_table = mutsig_io::read_exposure_tsv(out_dir.join("node_table.tsv")).unwrap();
    assert_eq!(node_table.n_groups(), 2 * N_PATIENTS);
    assert_eq!(node_table.keys[0].role, Some(BranchRole::Ancestral));

    let pvalue_path = dir.path().join("pvalues.tsv");
    let boxplot_path = dir.path().join("boxplots.svg");
    run_branch_test(
        &out_dir.join("node_table.tsv"),
        &pvalue_path,
        Some(&boxplot_path),
        &CohortConfig::default().boxplot,
    )
    .unwrap();
    let pvalues = std::fs::read_to_string(&pvalue_path).unwrap();
    let mut lines = pvalues.lines();
    assert_eq!(lines.next(), Some("Signature\tp_value"));
    for line in lines {
        let p: f64 = line.split('\t').nth(1).unwrap().parse().unwrap();
        assert!(p < 0.01);
    }
    assert!(boxplot_path.exists());

    // the per-sample table has no branch column to test on
    assert!(run_branch_test(
        &out_dir.join("samples_table.tsv"),
        &pvalue_path,
        None,
        &CohortConfig::default().boxplot,
    )
    .is_err());
}
