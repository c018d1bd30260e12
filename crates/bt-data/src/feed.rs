//! `DataFeed`: wires a loaded source through scope filtering, time-aligned
//! merge, and the configured HTF resamplers into the single `next()` call
//! the engine loop drives.

use std::collections::BTreeMap;

use bt_config::{DataConfig, HtfResamplerConfig};

use crate::errors::DataError;
use crate::htf::{HtfResampler, Timeframe};
use crate::merge::{merge_by_timestamp, MergedStep};
use crate::scope::apply_scope;
use crate::types::{Bar, HtfBar};

/// One fully merged timestep: the base bars present at `ts`, plus any HTF
/// bars whose bucket closed exactly on this step (`htf_bar.ts < ts`, since
/// the bucket that just closed started strictly before `ts`).
pub struct FeedStep {
    pub ts: i64,
    pub bars: BTreeMap<String, Bar>,
    /// `htf_bars[timeframe][symbol]`
    pub htf_bars: BTreeMap<String, BTreeMap<String, HtfBar>>,
}

pub struct DataFeed {
    steps: Vec<MergedStep>,
    cursor: usize,
    resamplers: Vec<(String, HtfResampler)>,
}

impl DataFeed {
    /// Builds a feed from an already-loaded per-symbol bar map, applying
    /// scope filtering and preparing the configured HTF resamplers.
    pub fn new(
        by_symbol: BTreeMap<String, Vec<Bar>>,
        data_cfg: &DataConfig,
        htf_cfg: &HtfResamplerConfig,
    ) -> Result<Self, DataError> {
        let scoped = apply_scope(by_symbol, data_cfg);
        let steps = merge_by_timestamp(scoped);

        let mut resamplers = Vec::new();
        for tf_str in &htf_cfg.timeframes {
            let tf = Timeframe::parse(tf_str)
                .ok_or_else(|| DataError::ManifestParse(format!("invalid timeframe: {tf_str}")))?;
            resamplers.push((tf_str.clone(), HtfResampler::new(tf, htf_cfg.strict)));
        }

        Ok(Self {
            steps,
            cursor: 0,
            resamplers,
        })
    }

    pub fn next(&mut self) -> Option<FeedStep> {
        if self.cursor >= self.steps.len() {
            return None;
        }
        let (ts, bars) = self.steps[self.cursor].clone();
        self.cursor += 1;

        let mut htf_bars: BTreeMap<String, BTreeMap<String, HtfBar>> = BTreeMap::new();
        for (tf_name, resampler) in &mut self.resamplers {
            let mut per_symbol: BTreeMap<String, HtfBar> = BTreeMap::new();
            for bar in bars.values() {
                if let Some(htf) = resampler.push(bar) {
                    per_symbol.insert(htf.symbol.clone(), htf);
                }
            }
            if !per_symbol.is_empty() {
                htf_bars.insert(tf_name.clone(), per_symbol);
            }
        }

        Some(FeedStep { ts, bars, htf_bars })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(ts: i64, symbol: &str) -> Bar {
        Bar::new(ts, symbol, 100, 101, 99, 100, 1)
    }

    #[test]
    fn htf_bar_timestamp_precedes_the_step_that_observes_it() {
        let mut data = BTreeMap::new();
        let bars: Vec<Bar> = (0..6).map(|m| bar(m * 60, "AAA")).collect();
        data.insert("AAA".to_string(), bars);

        let data_cfg = DataConfig::default();
        let htf_cfg = HtfResamplerConfig {
            timeframes: vec!["5m".to_string()],
            strict: true,
        };
        let mut feed = DataFeed::new(data, &data_cfg, &htf_cfg).unwrap();

        let mut last_step_with_htf = None;
        while let Some(step) = feed.next() {
            if !step.htf_bars.is_empty() {
                last_step_with_htf = Some((step.ts, step.htf_bars));
            }
        }
        let (observed_ts, htf) = last_step_with_htf.unwrap();
        let htf_bar = &htf["5m"]["AAA"];
        assert!(htf_bar.ts < observed_ts);
    }

    #[test]
    fn feed_is_empty_when_source_is_empty() {
        let data_cfg = DataConfig::default();
        let htf_cfg = HtfResamplerConfig::default();
        let mut feed = DataFeed::new(BTreeMap::new(), &data_cfg, &htf_cfg).unwrap();
        assert!(feed.next().is_none());
    }
}
