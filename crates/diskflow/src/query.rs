// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Time-series query construction.
//!
//! The analyzer consumes a query-language expression describing the
//! historical window to forecast from. Queries are built fresh per
//! disk (or per disk batch) and never persisted; only the rendered
//! expression string crosses the analyzer boundary.
//!
//! # Example
//!
//! ```rust
//! use diskflow::query::TimeSeriesQuery;
//!
//! let expr = TimeSeriesQuery::disk_used_percent()
//!     .for_disk("DISK-1A2B")
//!     .render();
//! assert!(expr.contains("from: now()-30d"));
//! assert!(expr.contains(r#"dt.entity.disk == "DISK-1A2B""#));
//! ```

/// Aggregated disk-usage metric the pipeline forecasts against.
pub const DISK_USED_PERCENT: &str = "max(dt.host.disk.used.percent)";

/// Default historical lookback window in days.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 30;

/// Entity filter for a query: one disk or an explicit set.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DiskFilter {
    /// No filter clause (query every disk the metric reports)
    All,
    /// `dt.entity.disk == "<id>"`
    Single(String),
    /// `in(dt.entity.disk, array("<id>", ...))`
    Set(Vec<String>),
}

/// Builder for the analyzer's time-series expression.
///
/// Renders the metric aggregation, grouping, lookback window, interval,
/// entity filter and display-name resolution into a single expression
/// string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSeriesQuery {
    metric: String,
    lookback_days: u32,
    interval_days: u32,
    group_by: Vec<String>,
    filter: DiskFilter,
    resolve_names: bool,
}

impl TimeSeriesQuery {
    /// Query over the disk-usage-percent metric, grouped by disk and
    /// host, with the default 30-day lookback at 1-day resolution.
    #[must_use]
    pub fn disk_used_percent() -> Self {
        Self {
            metric: DISK_USED_PERCENT.to_string(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            interval_days: 1,
            group_by: vec![
                "dt.entity.disk".to_string(),
                "dt.entity.host".to_string(),
                "host.name".to_string(),
            ],
            filter: DiskFilter::All,
            resolve_names: true,
        }
    }

    /// Restrict the query to a single disk.
    #[must_use]
    pub fn for_disk(mut self, disk_id: impl Into<String>) -> Self {
        self.filter = DiskFilter::Single(disk_id.into());
        self
    }

    /// Restrict the query to an explicit disk set.
    #[must_use]
    pub fn for_disks<I, S>(mut self, disk_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter = DiskFilter::Set(disk_ids.into_iter().map(Into::into).collect());
        self
    }

    /// Override the historical lookback window.
    #[must_use]
    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }

    /// Skip the trailing display-name resolution clauses.
    #[must_use]
    pub fn without_name_resolution(mut self) -> Self {
        self.resolve_names = false;
        self
    }

    /// Render the expression string handed to the analyzer.
    #[must_use]
    pub fn render(&self) -> String {
        let mut expr = format!(
            "timeseries {}, by: {{{}}}, from: now()-{}d, to: now(), interval: {}d",
            self.metric,
            self.group_by.join(", "),
            self.lookback_days,
            self.interval_days,
        );

        match &self.filter {
            DiskFilter::All => {}
            DiskFilter::Single(id) => {
                expr.push_str(&format!(r#", filter: dt.entity.disk == "{id}""#));
            }
            DiskFilter::Set(ids) => {
                let quoted: Vec<String> = ids.iter().map(|id| format!(r#""{id}""#)).collect();
                expr.push_str(&format!(
                    ", filter: in(dt.entity.disk, array({}))",
                    quoted.join(", ")
                ));
            }
        }

        if self.resolve_names {
            expr.push_str(
                " | fieldsAdd disk.name = entityName(dt.entity.disk), \
                 host.name = entityName(dt.entity.host)",
            );
        }

        expr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_disk_filter() {
        let expr = TimeSeriesQuery::disk_used_percent()
            .for_disk("DISK-1")
            .render();
        assert!(expr.starts_with("timeseries max(dt.host.disk.used.percent)"));
        assert!(expr.contains(r#"filter: dt.entity.disk == "DISK-1""#));
    }

    #[test]
    fn test_disk_set_filter() {
        let expr = TimeSeriesQuery::disk_used_percent()
            .for_disks(["DISK-1", "DISK-2"])
            .render();
        assert!(expr.contains(r#"in(dt.entity.disk, array("DISK-1", "DISK-2"))"#));
    }

    #[test]
    fn test_default_window_and_interval() {
        let expr = TimeSeriesQuery::disk_used_percent().render();
        assert!(expr.contains("from: now()-30d"));
        assert!(expr.contains("to: now()"));
        assert!(expr.contains("interval: 1d"));
    }

    #[test]
    fn test_lookback_override() {
        let expr = TimeSeriesQuery::disk_used_percent()
            .with_lookback_days(14)
            .render();
        assert!(expr.contains("from: now()-14d"));
    }

    #[test]
    fn test_name_resolution_clause() {
        let expr = TimeSeriesQuery::disk_used_percent().render();
        assert!(expr.contains("fieldsAdd disk.name = entityName(dt.entity.disk)"));

        let bare = TimeSeriesQuery::disk_used_percent()
            .without_name_resolution()
            .render();
        assert!(!bare.contains("fieldsAdd"));
    }

    #[test]
    fn test_grouping_includes_disk_and_host() {
        let expr = TimeSeriesQuery::disk_used_percent().render();
        assert!(expr.contains("by: {dt.entity.disk, dt.entity.host, host.name}"));
    }
}
