use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Integer bar index along the time axis.
pub type Logical = i64;

/// Bar open time in seconds since the UNIX epoch.
pub type Timestamp = i64;

/// A logical chart position.
///
/// `logical` and `time` describe the same bar; which one drives the x
/// projection depends on [`AxisMode`](crate::config::AxisMode). After any
/// mutation the owner re-derives `time` from `logical` through the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    #[serde(default, deserialize_with = "lenient_time")]
    pub time: Option<Timestamp>,
    #[serde(default, deserialize_with = "lenient_logical")]
    pub logical: Logical,
    #[serde(default)]
    pub price: f64,
}

impl Point {
    pub fn new(time: Option<Timestamp>, logical: Logical, price: f64) -> Self {
        Self {
            time,
            logical,
            price,
        }
    }

    /// A point with no known time; the host fills it in on first mutation.
    pub fn at(logical: Logical, price: f64) -> Self {
        Self::new(None, logical, price)
    }

    pub fn offset(&mut self, logical: Logical, price: f64) {
        self.logical += logical;
        self.price += price;
    }
}

/// Per-frame pointer movement in chart space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DragDelta {
    pub logical: Logical,
    pub price: f64,
}

impl DragDelta {
    pub fn new(logical: Logical, price: f64) -> Self {
        Self { logical, price }
    }

    /// Movement from `from` to `to`.
    pub fn between(from: &Point, to: &Point) -> Self {
        Self {
            logical: to.logical - from.logical,
            price: to.price - from.price,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.logical == 0 && self.price == 0.0
    }
}

// Charts hand out fractional logical indices and sometimes `null`; both are
// accepted and normalised to the nearest bar.
fn lenient_logical<'de, D>(deserializer: D) -> Result<Logical, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value
        .filter(|v| v.is_finite())
        .map(|v| v.round() as Logical)
        .unwrap_or_default())
}

// Business-day strings and other non-numeric times are treated as unknown.
fn lenient_time<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_f64()
        .filter(|v| v.is_finite())
        .map(|v| v.round() as Timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_between_points() {
        let a = Point::at(10, 100.0);
        let b = Point::at(15, 102.5);
        assert_eq!(DragDelta::between(&a, &b), DragDelta::new(5, 2.5));
        assert!(DragDelta::between(&a, &a).is_zero());
    }

    #[test]
    fn test_lenient_point_parsing() {
        let point: Point =
            serde_json::from_str(r#"{"time": 1700000000.0, "logical": 41.6, "price": 3.5}"#)
                .unwrap();
        assert_eq!(point, Point::new(Some(1_700_000_000), 42, 3.5));

        let point: Point =
            serde_json::from_str(r#"{"time": "2024-01-02", "logical": null, "price": 1}"#)
                .unwrap();
        assert_eq!(point, Point::new(None, 0, 1.0));

        let point: Point = serde_json::from_str(r#"{"price": 12.5}"#).unwrap();
        assert_eq!(point, Point::new(None, 0, 12.5));
    }
}
