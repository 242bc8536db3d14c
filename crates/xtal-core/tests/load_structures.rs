use nalgebra::Point3;
use std::path::Path;
use xtal::core::models::model::ModelSource;
use xtal::engine::config::ConnectivityConfig;
use xtal::engine::error::XtalError;
use xtal::workflows::load;

fn atom_line(serial: usize, name: &str, resname: &str, chain: &str, resseq: i32, xyz: [f64; 3], element: &str) -> String {
    format!(
        "ATOM  {:>5} {:<4} {:>3}{:>2}{:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}  ",
        serial, name, resname, chain, resseq, xyz[0], xyz[1], xyz[2], 1.0, 15.0, element
    )
}

fn cryst1(a: f64, b: f64, c: f64) -> String {
    format!(
        "CRYST1{:>9.3}{:>9.3}{:>9.3}{:>7.2}{:>7.2}{:>7.2} {:<11}{:>4}",
        a, b, c, 90.0, 90.0, 90.0, "P 1", 1
    )
}

fn pdb(lines: &[String]) -> String {
    let mut text = lines.join("\n");
    text.push_str("\nEND\n");
    text
}

const MMCIF: &str = "\
data_1ABC
_cell.length_a 20.0
_cell.length_b 20.0
_cell.length_c 20.0
_cell.angle_alpha 90
_cell.angle_beta 90
_cell.angle_gamma 90
_symmetry.space_group_name_H-M 'P 1'
loop_
_atom_site.group_PDB
_atom_site.id
_atom_site.type_symbol
_atom_site.label_atom_id
_atom_site.label_alt_id
_atom_site.label_comp_id
_atom_site.label_asym_id
_atom_site.label_seq_id
_atom_site.Cartn_x
_atom_site.Cartn_y
_atom_site.Cartn_z
_atom_site.occupancy
_atom_site.B_iso_or_equiv
_atom_site.auth_asym_id
_atom_site.pdbx_PDB_model_num
ATOM 1 N N . GLY A 1 0.000 0.000 0.000 1.00 10.0 A 1
ATOM 2 C CA . GLY A 1 1.450 0.000 0.000 1.00 10.0 A 1
ATOM 3 C C . GLY A 1 2.000 1.420 0.000 1.00 10.0 A 1
HETATM 4 O O . HOH B . 8.000 8.000 8.000 1.00 30.0 B 1
";

const MONOMER: &str = "\
data_comp_EOH
loop_
_chem_comp_atom.comp_id
_chem_comp_atom.atom_id
_chem_comp_atom.type_symbol
_chem_comp_atom.x
_chem_comp_atom.y
_chem_comp_atom.z
EOH C1 C 0.000 0.000 0.000
EOH C2 C 1.520 0.000 0.000
EOH O  O 2.030 1.350 0.000
EOH H1 H -0.370 -1.030 0.000
";

#[test]
fn cryst1_cell_orthogonalizes_fractional_centre() {
    let text = pdb(&[cryst1(10.0, 10.0, 10.0), atom_line(1, " CA ", "GLY", "A", 1, [1.0, 2.0, 3.0], "C")]);
    let model = load::load_pdb_str(&text, &ConnectivityConfig::default()).unwrap();
    let cell = model.unit_cell().unwrap();
    let centre = cell.orthogonalize(&Point3::new(0.5, 0.5, 0.5));
    assert!((centre - Point3::new(5.0, 5.0, 5.0)).norm() < 1e-9);
    assert_eq!(model.space_group(), Some("P 1"));
}

#[test]
fn two_close_carbons_are_bonded_to_each_other() {
    let text = pdb(&[
        atom_line(1, " C1 ", "LIG", "A", 1, [0.0, 0.0, 0.0], "C"),
        atom_line(2, " C2 ", "LIG", "A", 1, [1.2, 0.0, 0.0], "C"),
    ]);
    let model = load::load_pdb_str(&text, &ConnectivityConfig::default()).unwrap();
    assert_eq!(model.connectivity().as_slice(), &[vec![1], vec![0]]);
    assert_eq!(model.source(), ModelSource::Pdb);
}

#[test]
fn ter_record_splits_a_chain_label() {
    let text = pdb(&[
        atom_line(1, " CA ", "GLY", "A", 1, [0.0, 0.0, 0.0], "C"),
        "TER".to_string(),
        atom_line(2, " CA ", "GLY", "A", 2, [9.0, 0.0, 0.0], "C"),
    ]);
    let model = load::load_pdb_str(&text, &ConnectivityConfig::default()).unwrap();
    assert_eq!(model.chain_indices(), &[0, 1]);
    assert_eq!(model.chains().len(), 2);
}

#[test]
fn two_character_chain_labels_keep_both_columns() {
    let text = pdb(&[
        atom_line(1, " CA ", "GLY", "AB", 1, [0.0, 0.0, 0.0], "C"),
        atom_line(2, " CA ", "GLY", "CB", 2, [9.0, 0.0, 0.0], "C"),
    ]);
    let model = load::load_pdb_str(&text, &ConnectivityConfig::default()).unwrap();
    let chains: Vec<&str> = model.atoms().iter().map(|a| a.chain.as_str()).collect();
    assert_eq!(chains, vec!["AB", "CB"]);
    assert_eq!(model.chain_indices(), &[0, 1]);
}

#[test]
fn truncated_atom_record_is_a_pdb_error() {
    let mut line = atom_line(1, " CA ", "GLY", "A", 1, [0.0; 3], "C");
    line.truncate(60);
    let result = load::load_pdb_str(&line, &ConnectivityConfig::default());
    assert!(matches!(result, Err(XtalError::Pdb(_))));
}

#[test]
fn empty_structure_is_rejected() {
    let result = load::load_pdb_str("HEADER    NOTHING HERE\nEND\n", &ConnectivityConfig::default());
    assert!(matches!(result, Err(XtalError::Model(_))));
}

#[test]
fn mmcif_model_has_bonds_chains_and_ligand_flags() {
    let model = load::load_mmcif_str(MMCIF, &ConnectivityConfig::default()).unwrap();
    assert_eq!(model.n_atoms(), 4);
    assert_eq!(model.connectivity().neighbors(1), &[0, 2]);
    assert!(model.connectivity().neighbors(3).is_empty());
    assert_eq!(model.chain_indices(), &[0, 0, 0, 1]);
    assert_eq!(model.ligand_flags(), &[false, false, false, false]);
    assert_eq!(model.space_group(), Some("P 1"));
    assert_eq!(model.selection("chain=A name=CA").unwrap(), vec![1]);
}

#[test]
fn monomer_library_atoms_are_addressed_by_name() {
    let model = load::load_monomer_str(MONOMER, &ConnectivityConfig::default()).unwrap();
    assert_eq!(model.source(), ModelSource::MonomerLibrary);
    let indices = model.select_atom_names(&["C1", "C2", "O", "H1"]).unwrap();
    let &[c1, c2, o, h1] = indices.as_slice() else {
        panic!("expected four indices, got {:?}", indices);
    };
    assert_eq!(model.connectivity().neighbors(c2), &[c1, o]);
    assert_eq!(model.connectivity().neighbors(h1), &[c1]);
    assert!(model.has_hydrogens());
}

#[test]
fn paths_are_dispatched_by_extension_and_content() {
    let dir = tempfile::tempdir().unwrap();
    let config = ConnectivityConfig::default();

    let pdb_path = dir.path().join("two.pdb");
    std::fs::write(
        &pdb_path,
        pdb(&[
            atom_line(1, " N  ", "GLY", "A", 1, [0.0; 3], "N"),
            atom_line(2, " CA ", "GLY", "A", 1, [1.45, 0.0, 0.0], "C"),
        ]),
    )
    .unwrap();
    assert_eq!(load::load_structure_path(&pdb_path, &config).unwrap().n_atoms(), 2);

    let cif_path = dir.path().join("1abc.cif");
    std::fs::write(&cif_path, MMCIF).unwrap();
    assert_eq!(load::load_structure_path(&cif_path, &config).unwrap().source(), ModelSource::Mmcif);

    let monomer_path = dir.path().join("EOH.cif");
    std::fs::write(&monomer_path, MONOMER).unwrap();
    assert_eq!(
        load::load_structure_path(&monomer_path, &config).unwrap().source(),
        ModelSource::MonomerLibrary
    );

    assert!(matches!(
        load::load_structure_path(Path::new("/nonexistent/file.pdb"), &config),
        Err(XtalError::Pdb(_))
    ));
}
