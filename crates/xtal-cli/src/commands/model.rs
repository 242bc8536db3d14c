use crate::cli::ModelArgs;
use crate::config::{Overrides, build_load_config};
use crate::error::{CliError, Result};
use std::path::Path;
use tracing::info;
use xtal::core::models::model::Model;
use xtal::workflows::load;

pub fn run(args: ModelArgs, config_path: Option<&Path>) -> Result<()> {
    let overrides = Overrides {
        box_length: args.box_length,
        max_bond_length: args.max_bond_length,
        ..Overrides::default()
    };
    let config = build_load_config(config_path, overrides)?;

    info!("Loading structure from {}", args.path.display());
    let model = load::load_structure_path(&args.path, &config.connectivity)?;
    print!("{}", describe(&model));

    if let Some(expression) = &args.select {
        let selected = model
            .selection(expression)
            .map_err(|e| CliError::Argument(format!("selection '{}': {}", expression, e)))?;
        println!("Selection '{}': {} atoms", expression, selected.len());
        for &i in &selected {
            let atom = &model.atoms()[i];
            let p = atom.position();
            println!(
                "  {:>6} {:>2} {:>3} {:>5} {:<4}{:1} {:>9.3}{:>9.3}{:>9.3}",
                i,
                atom.chain,
                atom.resname,
                atom.resid(),
                atom.name,
                atom.altloc,
                p.x,
                p.y,
                p.z
            );
        }
    }
    Ok(())
}

fn describe(model: &Model) -> String {
    let chains = model.chains();
    let residues: usize = chains.iter().map(|c| c.residues().len()).sum();
    let mut text = format!(
        "Source:      {}\nAtoms:       {}{}\nChains:      {}\nResidues:    {}\nBonds:       {}\n",
        model.source(),
        model.n_atoms(),
        if model.has_hydrogens() { " (with hydrogens)" } else { "" },
        chains.len(),
        residues,
        model.connectivity().bond_count()
    );
    if let Some(cell) = model.unit_cell() {
        text.push_str(&format!("Cell:        {}\n", cell));
    }
    if let Some(space_group) = model.space_group() {
        text.push_str(&format!("Space group: {}\n", space_group));
    }
    if !model.symmetry_operators().is_empty() {
        text.push_str(&format!("Symmetry:    {} operators\n", model.symmetry_operators().len()));
    }
    let (center, size) = model.center_and_size();
    text.push_str(&format!(
        "Center:      ({:.3}, {:.3}, {:.3}), extent {:.3}\n",
        center.x, center.y, center.z, size
    ));
    let segments = model.extract_trace();
    if !segments.is_empty() {
        let traced: usize = segments.iter().map(Vec::len).sum();
        text.push_str(&format!("Trace:       {} segments, {} atoms\n", segments.len(), traced));
    }
    for feature in model.extract_interesting_residues() {
        text.push_str(&format!("  {}\n", feature));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use xtal::engine::config::ConnectivityConfig;

    #[test]
    fn description_lists_counts_and_features() {
        let text = "\
data_x
loop_
_atom_site.id
_atom_site.type_symbol
_atom_site.label_atom_id
_atom_site.label_comp_id
_atom_site.auth_asym_id
_atom_site.auth_seq_id
_atom_site.Cartn_x
_atom_site.Cartn_y
_atom_site.Cartn_z
1 C C1 LIG A 401 0.0 0.0 0.0
2 C C2 LIG A 401 1.5 0.0 0.0
";
        let model = load::load_mmcif_str(text, &ConnectivityConfig::default()).unwrap();
        let description = describe(&model);
        assert!(description.contains("Atoms:       2\n"));
        assert!(description.contains("Bonds:       1\n"));
        assert!(description.contains("ligand: LIG  A  401"));
        assert!(!description.contains("Cell:"));
    }
}
