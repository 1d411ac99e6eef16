//! Portfolio-level analytics over loaded policy records.
//!
//! A [`Portfolio`] drains a [`RecordSource`] exactly once, cleaning the
//! vehicle introduction date of every row on the way in. From there the
//! operations are mechanical: grouped premium/claims/loss-ratio summaries
//! along a chosen axis and a Welch two-sample test between two groups.

use crate::intro_date::{self, IntroDate, NormalizeOptions};
use crate::record::PolicyRecord;
use crate::source::RecordSource;
use crate::stats::{self, TwoSampleTTest};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Grouping axis for portfolio summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Province,
    Gender,
    VehicleType,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Province => write!(f, "province"),
            Dimension::Gender => write!(f, "gender"),
            Dimension::VehicleType => write!(f, "vehicle_type"),
        }
    }
}

impl FromStr for Dimension {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "province" => Ok(Dimension::Province),
            "gender" => Ok(Dimension::Gender),
            "vehicle_type" => Ok(Dimension::VehicleType),
            other => Err(anyhow::anyhow!("Unknown dimension: {other}")),
        }
    }
}

/// Column a two-sample comparison is run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    TotalPremium,
    TotalClaims,
    LossRatio,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::TotalPremium => write!(f, "total_premium"),
            Metric::TotalClaims => write!(f, "total_claims"),
            Metric::LossRatio => write!(f, "loss_ratio"),
        }
    }
}

impl FromStr for Metric {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "total_premium" => Ok(Metric::TotalPremium),
            "total_claims" => Ok(Metric::TotalClaims),
            "loss_ratio" => Ok(Metric::LossRatio),
            other => Err(anyhow::anyhow!("Unknown metric: {other}")),
        }
    }
}

/// Aggregates for one partition of the portfolio.
#[derive(Debug, Clone, Serialize)]
pub struct GroupSummary {
    pub policies: usize,
    pub total_premium: f64,
    pub total_claims: f64,
    pub mean_loss_ratio: f64,
}

/// A loaded portfolio with its cleaned introduction-date column.
pub struct Portfolio {
    records: Vec<PolicyRecord>,
    intro_dates: Vec<IntroDate>,
}

impl Portfolio {
    /// Drain `source` and normalize the vehicle introduction date of every
    /// record. Fails when the source yields no rows.
    pub fn load(source: &mut dyn RecordSource, options: &NormalizeOptions) -> Result<Self> {
        let records = source.load().context("Failed to load policy records")?;
        if records.is_empty() {
            return Err(anyhow::anyhow!("Record source yielded no rows"));
        }

        let intro_dates: Vec<IntroDate> = records
            .iter()
            .map(|record| {
                intro_date::normalize_with(record.vehicle_intro_date.as_deref(), options)
            })
            .collect();

        let invalid_dates = intro_dates.iter().filter(|date| date.is_invalid()).count();
        if invalid_dates > 0 {
            warn!(
                invalid_dates,
                total = records.len(),
                "Some vehicle introduction dates did not parse"
            );
        }

        info!(
            count = records.len(),
            invalid_dates, "Portfolio loaded"
        );

        Ok(Self {
            records,
            intro_dates,
        })
    }

    pub fn records(&self) -> &[PolicyRecord] {
        &self.records
    }

    /// The cleaned introduction-date column, one entry per record.
    pub fn intro_dates(&self) -> &[IntroDate] {
        &self.intro_dates
    }

    /// Per-record loss ratios, skipping records without a meaningful ratio.
    pub fn loss_ratios(&self) -> Vec<f64> {
        self.records
            .iter()
            .filter_map(PolicyRecord::loss_ratio)
            .collect()
    }

    /// Group totals and mean loss ratio along `dimension`, ordered by mean
    /// loss ratio, worst first.
    pub fn summarize_by(&self, dimension: Dimension) -> Vec<(String, GroupSummary)> {
        let mut groups: BTreeMap<String, Vec<&PolicyRecord>> = BTreeMap::new();
        for record in &self.records {
            groups
                .entry(group_key(record, dimension))
                .or_default()
                .push(record);
        }

        let mut summaries: Vec<(String, GroupSummary)> = groups
            .into_iter()
            .map(|(key, members)| {
                let ratios: Vec<f64> = members
                    .iter()
                    .filter_map(|record| record.loss_ratio())
                    .collect();
                let summary = GroupSummary {
                    policies: members.len(),
                    total_premium: members.iter().map(|record| record.total_premium).sum(),
                    total_claims: members.iter().map(|record| record.total_claims).sum(),
                    mean_loss_ratio: stats::mean(&ratios).unwrap_or(0.0),
                };
                (key, summary)
            })
            .collect();

        summaries.sort_by(|a, b| b.1.mean_loss_ratio.total_cmp(&a.1.mean_loss_ratio));
        summaries
    }

    /// Welch two-sample test comparing `metric` between two groups along
    /// `dimension`.
    pub fn ab_test(
        &self,
        dimension: Dimension,
        group_a: &str,
        group_b: &str,
        metric: Metric,
    ) -> Result<TwoSampleTTest> {
        let a = self.metric_values(dimension, group_a, metric);
        let b = self.metric_values(dimension, group_b, metric);

        debug!(
            %dimension,
            group_a,
            group_b,
            %metric,
            sample_a = a.len(),
            sample_b = b.len(),
            "Running two-sample test"
        );

        stats::welch_t_test(&a, &b).ok_or_else(|| {
            anyhow::anyhow!(
                "Not enough data to compare {group_a} ({} rows) with {group_b} ({} rows) on {metric}",
                a.len(),
                b.len()
            )
        })
    }

    fn metric_values(&self, dimension: Dimension, group: &str, metric: Metric) -> Vec<f64> {
        self.records
            .iter()
            .filter(|record| group_key(record, dimension) == group)
            .filter_map(|record| metric_value(record, metric))
            .collect()
    }
}

fn group_key(record: &PolicyRecord, dimension: Dimension) -> String {
    match dimension {
        Dimension::Province => record.province.clone(),
        Dimension::Gender => record.gender.to_string(),
        Dimension::VehicleType => record.vehicle_type.clone(),
    }
}

fn metric_value(record: &PolicyRecord, metric: Metric) -> Option<f64> {
    match metric {
        Metric::TotalPremium => Some(record.total_premium),
        Metric::TotalClaims => Some(record.total_claims),
        Metric::LossRatio => record.loss_ratio(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Gender;
    use crate::source::MemorySource;
    use chrono::NaiveDate;

    fn record(
        province: &str,
        gender: Gender,
        vehicle_type: &str,
        premium: f64,
        claims: f64,
        intro_date: Option<&str>,
    ) -> PolicyRecord {
        PolicyRecord {
            province: province.into(),
            gender,
            vehicle_type: vehicle_type.into(),
            total_premium: premium,
            total_claims: claims,
            vehicle_intro_date: intro_date.map(Into::into),
        }
    }

    fn sample_records() -> Vec<PolicyRecord> {
        vec![
            record("Gauteng", Gender::Male, "Sedan", 1000.0, 500.0, Some("6/2002")),
            record("Western Cape", Gender::Female, "SUV", 1200.0, 600.0, Some("2020-06-15")),
            record("Gauteng", Gender::Male, "Sedan", 1100.0, 550.0, None),
            record("Western Cape", Gender::Female, "SUV", 1300.0, 650.0, Some("not a date")),
        ]
    }

    fn sample_portfolio() -> Portfolio {
        let mut source = MemorySource::new(sample_records());
        Portfolio::load(&mut source, &NormalizeOptions::default()).unwrap()
    }

    #[test]
    fn load_normalizes_the_intro_date_column() {
        let portfolio = sample_portfolio();
        let dates = portfolio.intro_dates();

        assert_eq!(
            dates[0],
            IntroDate::Parsed(NaiveDate::from_ymd_opt(2002, 6, 1).unwrap())
        );
        assert_eq!(
            dates[1],
            IntroDate::Parsed(NaiveDate::from_ymd_opt(2020, 6, 15).unwrap())
        );
        assert_eq!(dates[2], IntroDate::Invalid);
        assert_eq!(dates[3], IntroDate::Invalid);
    }

    #[test]
    fn load_keeps_one_date_per_record() {
        let portfolio = sample_portfolio();
        assert_eq!(portfolio.records().len(), portfolio.intro_dates().len());
    }

    #[test]
    fn load_fails_on_an_empty_source() {
        let mut source = MemorySource::new(Vec::new());
        assert!(Portfolio::load(&mut source, &NormalizeOptions::default()).is_err());
    }

    #[test]
    fn loss_ratios_cover_every_priced_record() {
        let portfolio = sample_portfolio();
        let ratios = portfolio.loss_ratios();

        assert_eq!(ratios.len(), 4);
        assert!(ratios.iter().all(|ratio| (ratio - 0.5).abs() < 1e-12));
    }

    #[test]
    fn summarize_by_province_totals_each_group() {
        let portfolio = sample_portfolio();
        let summaries = portfolio.summarize_by(Dimension::Province);
        assert_eq!(summaries.len(), 2);

        let (_, gauteng) = summaries
            .iter()
            .find(|(name, _)| name == "Gauteng")
            .unwrap();
        assert_eq!(gauteng.policies, 2);
        assert_eq!(gauteng.total_premium, 2100.0);
        assert_eq!(gauteng.total_claims, 1050.0);
        assert!((gauteng.mean_loss_ratio - 0.5).abs() < 1e-12);
    }

    #[test]
    fn summaries_rank_the_worst_loss_ratio_first() {
        let mut source = MemorySource::new(vec![
            record("Gauteng", Gender::Male, "Sedan", 1000.0, 200.0, None),
            record("Limpopo", Gender::Female, "SUV", 1000.0, 900.0, None),
        ]);
        let portfolio = Portfolio::load(&mut source, &NormalizeOptions::default()).unwrap();

        let summaries = portfolio.summarize_by(Dimension::Province);
        assert_eq!(summaries[0].0, "Limpopo");
        assert_eq!(summaries[1].0, "Gauteng");
    }

    #[test]
    fn summarize_by_gender_uses_dataset_spellings() {
        let portfolio = sample_portfolio();
        let summaries = portfolio.summarize_by(Dimension::Gender);

        let keys: Vec<&str> = summaries.iter().map(|(key, _)| key.as_str()).collect();
        assert!(keys.contains(&"M"));
        assert!(keys.contains(&"F"));
    }

    #[test]
    fn ab_test_compares_two_provinces() {
        let portfolio = sample_portfolio();
        let result = portfolio
            .ab_test(
                Dimension::Province,
                "Gauteng",
                "Western Cape",
                Metric::TotalPremium,
            )
            .unwrap();

        // Premiums [1000, 1100] vs [1200, 1300]: t = -200 / sqrt(5000).
        assert!((result.t_stat + 2.828_427).abs() < 1e-3, "t = {}", result.t_stat);
        assert!((result.df - 2.0).abs() < 1e-9, "df = {}", result.df);
        assert!(result.p_value > 0.0 && result.p_value <= 1.0);
    }

    #[test]
    fn ab_test_rejects_an_unknown_group() {
        let portfolio = sample_portfolio();
        let result = portfolio.ab_test(
            Dimension::Province,
            "Gauteng",
            "Atlantis",
            Metric::TotalPremium,
        );
        assert!(result.is_err());
    }

    #[test]
    fn dimension_and_metric_names_round_trip() {
        for dimension in [Dimension::Province, Dimension::Gender, Dimension::VehicleType] {
            assert_eq!(
                dimension.to_string().parse::<Dimension>().unwrap(),
                dimension
            );
        }
        for metric in [Metric::TotalPremium, Metric::TotalClaims, Metric::LossRatio] {
            assert_eq!(metric.to_string().parse::<Metric>().unwrap(), metric);
        }
    }
}
