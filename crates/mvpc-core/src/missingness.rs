//! Discovery of the direct causes of missingness.
//!
//! For every column `x` with missing values and its indicator `R_x`, every
//! other substantive variable `p` is a candidate parent of `R_x`. If no
//! conditioning set drawn from the remaining columns separates `R_x` from `p`
//! (the empty set included), `p` is taken to be a direct cause of the
//! missingness of `x` and the marked arrow `p -*→ R_x` is added.
//!
//! Self-masking (`x` causing its own missingness) is not tested: after
//! test-wise deletion `R_x` is constant wherever `x` is observed.
use crate::context::StageContext;
use crate::error::DiscoveryError;
use crate::graph::MarkedGraph;
use crate::report::{DiscoveryEvent, Stage};
use crate::search::{SearchMode, find_separating_sets, query};
use crate::table::{Table, indicator_name};

/// A discovered `(parent, indicator)` marked arrow.
pub type MissingnessCause = (String, String);

/// Adds `p -*→ R_x` for each discovered cause of missingness and returns the
/// discovered pairs in discovery order.
///
/// Columns whose indicator is absent from `data` are skipped. Nothing is
/// written to the separating-set registry.
///
/// # Errors
///
/// Propagates oracle failures.
pub fn find_missingness_causes(
    ctx: &StageContext<'_>,
    data: &Table,
    graph: &mut MarkedGraph,
) -> Result<Vec<MissingnessCause>, DiscoveryError> {
    let prefix = ctx.config.indicator_prefix.as_str();
    let substantive = data.substantive_columns(prefix);
    let all_columns = data.column_names();
    let mut causes = Vec::new();

    for column in data.columns_with_missing() {
        let indicator = indicator_name(prefix, column);
        if !data.has_column(&indicator) {
            continue;
        }

        for &candidate in substantive.iter().filter(|&&c| c != column) {
            let pool: Vec<&str> = all_columns
                .iter()
                .copied()
                .filter(|&c| c != column && c != indicator && c != candidate)
                .collect();
            let separating = find_separating_sets(
                &pool,
                ctx.config.max_depth,
                SearchMode::FirstOnly,
                |z| query(ctx.oracle, data, &[indicator.as_str()], &[candidate], z),
            )?;
            if !separating.is_empty() {
                continue;
            }
            if graph.add_marked_arrow(candidate, &indicator) {
                ctx.emit(DiscoveryEvent::ArrowAdded {
                    stage: Stage::MissingnessCauses,
                    from: candidate.to_owned(),
                    to: indicator.clone(),
                    marked: true,
                });
            }
            causes.push((candidate.to_owned(), indicator.clone()));
        }
    }

    Ok(causes)
}
