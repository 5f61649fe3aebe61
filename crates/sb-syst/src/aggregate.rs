//! Combination of statistical and systematic covariance matrices.

use std::collections::BTreeMap;

use sb_core::CovarianceMatrix;

/// Combine a statistical covariance with named systematic
/// contributions into one sanitized total.
///
/// Contributions whose dimension disagrees with the statistical
/// matrix are skipped with a warning: one malformed or not-yet-ready
/// systematic source must not abort an analysis run. Every matrix is
/// sanitized (NaN/±∞ → 0.0) before addition and the total is
/// sanitized once more at the end.
pub fn combine(
    statistical: &CovarianceMatrix,
    systematics: &BTreeMap<String, CovarianceMatrix>,
) -> CovarianceMatrix {
    let mut total = statistical.clone();
    total.sanitize();

    for (name, contribution) in systematics {
        if contribution.dim() != total.dim() {
            log::warn!(
                "skipping systematic '{}': dimension {} does not match statistical dimension {}",
                name,
                contribution.dim(),
                total.dim()
            );
            continue;
        }
        let mut sanitized = contribution.clone();
        sanitized.sanitize();
        for (t, c) in total.as_mut_slice().iter_mut().zip(sanitized.as_slice()) {
            *t += *c;
        }
    }

    total.sanitize();
    total
}
