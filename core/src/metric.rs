use crate::segment::Segment;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Physical quantity addressed by the metric index of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Humidity,
    Temperature,
    Ph,
    Nitrogen,
    Phosphorus,
    Potassium,
}

impl MetricKind {
    pub const ALL: [MetricKind; 6] = [
        MetricKind::Humidity,
        MetricKind::Temperature,
        MetricKind::Ph,
        MetricKind::Nitrogen,
        MetricKind::Phosphorus,
        MetricKind::Potassium,
    ];

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(MetricKind::Humidity),
            2 => Some(MetricKind::Temperature),
            3 => Some(MetricKind::Ph),
            4 => Some(MetricKind::Nitrogen),
            5 => Some(MetricKind::Phosphorus),
            6 => Some(MetricKind::Potassium),
            _ => None,
        }
    }

    pub fn index(self) -> u8 {
        match self {
            MetricKind::Humidity => 1,
            MetricKind::Temperature => 2,
            MetricKind::Ph => 3,
            MetricKind::Nitrogen => 4,
            MetricKind::Phosphorus => 5,
            MetricKind::Potassium => 6,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MetricKind::Humidity => "humidity",
            MetricKind::Temperature => "temperature",
            MetricKind::Ph => "ph",
            MetricKind::Nitrogen => "nitrogen",
            MetricKind::Phosphorus => "phosphorus",
            MetricKind::Potassium => "potassium",
        }
    }
}

/// All readings of one uplink folded into named metrics.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MetricSet {
    values: BTreeMap<MetricKind, f64>,
    sensor_codes: BTreeSet<String>,
    plot_codes: BTreeSet<String>,
}

impl MetricSet {
    /// Later segments overwrite earlier ones for the same metric, unknown
    /// indices are dropped.
    pub fn aggregate(segments: &[Segment]) -> Self {
        let mut set = MetricSet::default();
        for segment in segments {
            if let Some(code) = &segment.sensor_code {
                set.sensor_codes.insert(code.clone());
            }
            if let Some(code) = &segment.plot_code {
                set.plot_codes.insert(code.clone());
            }
            match MetricKind::from_index(segment.metric_index) {
                Some(kind) => {
                    set.values.insert(kind, segment.value);
                }
                None => tracing::debug!(
                    index = segment.metric_index,
                    "Dropping reading with unknown metric index"
                ),
            }
        }
        set
    }

    pub fn get(&self, kind: MetricKind) -> Option<f64> {
        self.values.get(&kind).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetricKind, f64)> + '_ {
        self.values.iter().map(|(kind, value)| (*kind, *value))
    }

    pub fn sensor_codes(&self) -> &BTreeSet<String> {
        &self.sensor_codes
    }

    pub fn plot_codes(&self) -> &BTreeSet<String> {
        &self.plot_codes
    }

    /// The plot code, if the whole batch agrees on exactly one.
    pub fn single_plot_code(&self) -> Option<&str> {
        if self.plot_codes.len() == 1 {
            self.plot_codes.iter().next().map(String::as_str)
        } else {
            None
        }
    }

    /// JSON snapshot of the metrics present, `{"temperature": 66.0, ..}`.
    pub fn raw_map(&self) -> Value {
        let map: Map<String, Value> = self
            .iter()
            .filter_map(|(kind, value)| {
                Number::from_f64(value).map(|n| (kind.name().to_owned(), Value::Number(n)))
            })
            .collect();
        Value::Object(map)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::segment::parse_batch;
    use serde_json::json;

    #[test]
    fn test_index_mapping() {
        for kind in MetricKind::ALL {
            assert_eq!(Some(kind), MetricKind::from_index(kind.index()));
        }
        assert_eq!(None, MetricKind::from_index(0));
        assert_eq!(None, MetricKind::from_index(7));
        assert_eq!("ph", MetricKind::from_index(3).unwrap().name());
    }

    #[test]
    fn test_last_segment_wins() {
        let batch = parse_batch("d:6700 s:cap1;2 p:1,d:6600 s:cap1;2 p:1");
        let set = MetricSet::aggregate(&batch.segments);

        assert_eq!(1, set.len());
        assert_eq!(Some(66.0), set.get(MetricKind::Temperature));
        assert_eq!(Some("1"), set.single_plot_code());
        assert!(set.sensor_codes().contains("cap1"));
    }

    #[test]
    fn test_unknown_index_dropped() {
        let batch = parse_batch("d:100 s:cap1;9,d:5500 s:cap1;1");
        let set = MetricSet::aggregate(&batch.segments);

        assert_eq!(1, set.len());
        assert_eq!(Some(55.0), set.get(MetricKind::Humidity));
        assert_eq!(None, set.single_plot_code());
    }

    #[test]
    fn test_only_unknown_indices() {
        let batch = parse_batch("d:100 s:cap1;0,d:200 s:cap1;42");
        let set = MetricSet::aggregate(&batch.segments);
        assert!(set.is_empty());
        assert_eq!(json!({}), set.raw_map());
    }

    #[test]
    fn test_raw_map() {
        let batch = parse_batch("d:100 s:3,d:1500 s:2,d:1000 s:4");
        let set = MetricSet::aggregate(&batch.segments);
        assert_eq!(
            json!({ "ph": 1.0, "temperature": 15.0, "nitrogen": 10.0 }),
            set.raw_map()
        );
    }

    #[test]
    fn test_conflicting_plot_codes() {
        let batch = parse_batch("d:100 s:a;1 p:1,d:200 s:a;2 p:2");
        let set = MetricSet::aggregate(&batch.segments);
        assert_eq!(2, set.plot_codes().len());
        assert_eq!(None, set.single_plot_code());
    }
}
