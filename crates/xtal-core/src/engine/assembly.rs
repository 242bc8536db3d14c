use super::config::ConnectivityConfig;
use super::connectivity;
use crate::core::models::model::{Model, ModelError, ModelParts};
use tracing::debug;

/// Perceives bonds for freshly read atoms and seals them into a [`Model`].
pub fn assemble_model(parts: ModelParts, config: &ConnectivityConfig) -> Result<Model, ModelError> {
    if parts.atoms.is_empty() {
        return Err(ModelError::EmptyStructure);
    }
    let connectivity = connectivity::build_fast(&parts.atoms, config)?;
    debug!(
        source = %parts.source,
        atoms = parts.atoms.len(),
        bonds = connectivity.bond_count(),
        "Assembling model"
    );
    Model::new(parts, connectivity)
}
