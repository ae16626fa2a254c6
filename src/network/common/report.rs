use crate::network::inference::builder::Realization;
use crate::network::inference::engine::Estimate;
use crate::network::inference::evidence::InferenceMode;
use crate::network::model::trace::SiteStatus;
use anyhow::{Context, Result};
use colored::Colorize;

/// `P(Interest1=politics | {Topic1=1})`, with `do(..)` for interventions.
pub fn describe(estimate: &Estimate) -> String {
    let given = match estimate.mode {
        InferenceMode::Condition => estimate.evidence.to_string(),
        InferenceMode::Intervention => format!("do{}", estimate.evidence),
    };
    format!("P({}={} | {})", estimate.site, estimate.label, given)
}

pub fn render_estimate(estimate: &Estimate) -> String {
    let ess = if estimate.effective_sample_size < 0.01 * estimate.samples as f64 {
        format!("{:.1}", estimate.effective_sample_size).red()
    } else {
        format!("{:.1}", estimate.effective_sample_size).normal()
    };
    format!(
        "{} = {}\n  weighted {:.4}, effective sample size {} of {}, seed {}",
        describe(estimate).bold(),
        format!("{:.4}", estimate.probability).green().bold(),
        estimate.weighted_probability,
        ess,
        estimate.samples,
        estimate.seed
    )
}

pub fn estimate_json(estimates: &[Estimate]) -> Result<String> {
    serde_json::to_string_pretty(estimates).context("Failed to serialize estimates")
}

/// One line per entity: name, trace name, and the label drawn in `realization`.
pub fn render_realization(realization: &Realization) -> String {
    let mut lines = Vec::new();
    for site in realization.sites() {
        let status = match site.status {
            SiteStatus::Sampled => "sampled".normal(),
            SiteStatus::Observed { likelihood } => format!("observed, likelihood {:.3}", likelihood).yellow(),
            SiteStatus::Intervened => "intervened".magenta(),
        };
        let parents = if site.parents.is_empty() {
            String::new()
        } else {
            format!(" <- {}", site.parents.join(", "))
        };
        lines.push(format!("{:<16} {:<14} {}{}", site.name.cyan(), site.label(), status, parents));
    }
    let names: Vec<&str> = realization.entities().map(|(name, _)| name).collect();
    lines.push(format!("entities: {}", names.join(", ")));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::inference::evidence::Evidence;

    fn estimate(mode: InferenceMode) -> Estimate {
        Estimate {
            site: "Interest1".to_string(),
            value: 1,
            label: "politics".to_string(),
            mode,
            evidence: Evidence::single("Topic1", 1),
            samples: 100,
            probability: 0.8,
            weighted_probability: 0.79,
            effective_sample_size: 64.0,
            seed: 3,
        }
    }

    #[test]
    fn test_describe_marks_interventions() {
        assert_eq!(
            describe(&estimate(InferenceMode::Condition)),
            "P(Interest1=politics | {Topic1=1})"
        );
        assert_eq!(
            describe(&estimate(InferenceMode::Intervention)),
            "P(Interest1=politics | do{Topic1=1})"
        );
    }

    #[test]
    fn test_json_lists_estimates() {
        let json = estimate_json(&[estimate(InferenceMode::Condition)]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["mode"], "condition");
        assert_eq!(parsed[0]["probability"], 0.8);
    }
}
