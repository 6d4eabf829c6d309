/// Data type compatibility between connected nodes
///
/// Used once, when an edge is created, to gate the connection and pick the type
/// label stored on the edge.

use crate::workflow::types::DataType;

/// True iff the two type lists intersect, or either side declares `Any`
pub fn is_compatible(source_outputs: &[DataType], target_inputs: &[DataType]) -> bool {
    if source_outputs.contains(&DataType::Any) || target_inputs.contains(&DataType::Any) {
        return true;
    }
    source_outputs.iter().any(|t| target_inputs.contains(t))
}

/// Pick the concrete type to label a new edge with
///
/// Prefers the first source output type the target accepts; falls back to `Any`
/// when either side declares it. `None` means the connection must be rejected.
pub fn resolve_edge_type(source_outputs: &[DataType], target_inputs: &[DataType]) -> Option<DataType> {
    source_outputs
        .iter()
        .copied()
        .find(|t| target_inputs.contains(t))
        .or_else(|| {
            (source_outputs.contains(&DataType::Any) || target_inputs.contains(&DataType::Any))
                .then_some(DataType::Any)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use DataType::*;

    #[test]
    fn compatibility_requires_overlap_or_wildcard() {
        assert!(!is_compatible(&[Csv], &[Dataframe]));
        assert!(is_compatible(&[Csv], &[Csv, Dataframe]));
        assert!(is_compatible(&[Any], &[Csv]));
        assert!(is_compatible(&[Csv], &[Any]));
        assert!(!is_compatible(&[], &[Csv]));
        assert!(!is_compatible(&[Result], &[]));
    }

    #[test]
    fn edge_type_prefers_first_shared_source_type() {
        assert_eq!(
            resolve_edge_type(&[Model, Result], &[Result, Model, Json]),
            Some(Model)
        );
        assert_eq!(
            resolve_edge_type(&[Csv, Dataframe], &[ProcessedData, Dataframe]),
            Some(Dataframe)
        );
    }

    #[test]
    fn edge_type_falls_back_to_wildcard() {
        assert_eq!(resolve_edge_type(&[Csv], &[Any]), Some(Any));
        assert_eq!(resolve_edge_type(&[Any], &[Json]), Some(Any));
        assert_eq!(resolve_edge_type(&[Csv], &[Json]), None);
    }
}
