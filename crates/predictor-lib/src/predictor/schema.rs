//! Serving-time request schema and record validation

use crate::error::RequestError;
use serde_json::Value;
use std::fmt;

/// Domain constraint applied to one request field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    NonNegative,
    Positive,
}

impl FieldRule {
    fn check(self, value: f64) -> bool {
        match self {
            FieldRule::NonNegative => value >= 0.0,
            FieldRule::Positive => value > 0.0,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            FieldRule::NonNegative => "must be >= 0",
            FieldRule::Positive => "must be > 0",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub rule: FieldRule,
}

/// The exact set of fields a prediction request must carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServingSchema {
    fields: Vec<FieldSpec>,
}

impl ServingSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// LSTAT, RM, CRIM, PTRATIO, INDUS, TAX, NOX, B
    pub fn boston() -> Self {
        use FieldRule::*;
        let field = |name: &str, rule| FieldSpec {
            name: name.to_string(),
            rule,
        };
        Self::new(vec![
            field("LSTAT", NonNegative),
            field("RM", Positive),
            field("CRIM", NonNegative),
            field("PTRATIO", Positive),
            field("INDUS", NonNegative),
            field("TAX", Positive),
            field("NOX", Positive),
            field("B", NonNegative),
        ])
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl fmt::Display for ServingSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.field_names().join(", "))
    }
}

/// A validated request: every schema field present, finite and in domain
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    values: Vec<(String, f64)>,
}

impl FeatureRecord {
    /// Validate a JSON object against `schema`
    pub fn from_json(body: &Value, schema: &ServingSchema) -> Result<Self, RequestError> {
        let object = body.as_object().ok_or(RequestError::NotAnObject)?;

        if let Some(unknown) = object.keys().find(|k| schema.field(k).is_none()) {
            return Err(RequestError::UnknownField(unknown.clone()));
        }

        let pairs = schema
            .fields()
            .iter()
            .map(|spec| {
                let raw = object
                    .get(&spec.name)
                    .ok_or_else(|| RequestError::MissingField(spec.name.clone()))?;
                let value = raw.as_f64().ok_or_else(|| RequestError::NotNumeric {
                    field: spec.name.clone(),
                })?;
                Ok((spec.name.clone(), value))
            })
            .collect::<Result<Vec<_>, RequestError>>()?;

        Self::from_pairs(pairs, schema)
    }

    /// Validate already-typed values against `schema`
    pub fn from_pairs<I, S>(pairs: I, schema: &ServingSchema) -> Result<Self, RequestError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let pairs: Vec<(String, f64)> = pairs.into_iter().map(|(k, v)| (k.into(), v)).collect();

        if let Some((unknown, _)) = pairs.iter().find(|(k, _)| schema.field(k).is_none()) {
            return Err(RequestError::UnknownField(unknown.clone()));
        }

        let mut values = Vec::with_capacity(schema.len());
        for spec in schema.fields() {
            let value = pairs
                .iter()
                .find(|(k, _)| *k == spec.name)
                .map(|(_, v)| *v)
                .ok_or_else(|| RequestError::MissingField(spec.name.clone()))?;
            if !value.is_finite() {
                return Err(RequestError::NonFinite {
                    field: spec.name.clone(),
                });
            }
            if !spec.rule.check(value) {
                return Err(RequestError::OutOfDomain {
                    field: spec.name.clone(),
                    value,
                    rule: spec.rule.describe(),
                });
            }
            values.push((spec.name.clone(), value));
        }

        Ok(Self { values })
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.iter().find(|(k, _)| k == name).map(|(_, v)| *v)
    }

    /// Values laid out in `order`; `None` if any name is absent
    pub fn row(&self, order: &[String]) -> Option<Vec<f64>> {
        order.iter().map(|name| self.get(name)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "LSTAT": 4.98, "RM": 6.575, "CRIM": 0.00632, "PTRATIO": 15.3,
            "INDUS": 2.31, "TAX": 296.0, "NOX": 0.538, "B": 396.9
        })
    }

    #[test]
    fn test_valid_record() {
        let record = FeatureRecord::from_json(&valid(), &ServingSchema::boston()).unwrap();
        assert_eq!(record.get("RM"), Some(6.575));
        assert_eq!(record.get("ZN"), None);
    }

    #[test]
    fn test_row_follows_requested_order() {
        let record = FeatureRecord::from_json(&valid(), &ServingSchema::boston()).unwrap();
        let row = record.row(&["TAX".to_string(), "RM".to_string()]).unwrap();
        assert_eq!(row, vec![296.0, 6.575]);
        assert!(record.row(&["ZN".to_string()]).is_none());
    }

    #[test]
    fn test_missing_field() {
        let mut body = valid();
        body.as_object_mut().unwrap().remove("NOX");
        assert_eq!(
            FeatureRecord::from_json(&body, &ServingSchema::boston()),
            Err(RequestError::MissingField("NOX".to_string()))
        );
    }

    #[test]
    fn test_unknown_field() {
        let mut body = valid();
        body["ZN"] = json!(18.0);
        assert_eq!(
            FeatureRecord::from_json(&body, &ServingSchema::boston()),
            Err(RequestError::UnknownField("ZN".to_string()))
        );
    }

    #[test]
    fn test_non_numeric_field() {
        let mut body = valid();
        body["RM"] = json!("six");
        assert!(matches!(
            FeatureRecord::from_json(&body, &ServingSchema::boston()),
            Err(RequestError::NotNumeric { field }) if field == "RM"
        ));
        body["RM"] = Value::Null;
        assert!(FeatureRecord::from_json(&body, &ServingSchema::boston()).is_err());
    }

    #[test]
    fn test_negative_crim_out_of_domain() {
        let mut body = valid();
        body["CRIM"] = json!(-1);
        assert!(matches!(
            FeatureRecord::from_json(&body, &ServingSchema::boston()),
            Err(RequestError::OutOfDomain { field, value, .. }) if field == "CRIM" && value == -1.0
        ));
    }

    #[test]
    fn test_zero_rooms_out_of_domain() {
        let mut body = valid();
        body["RM"] = json!(0.0);
        assert!(matches!(
            FeatureRecord::from_json(&body, &ServingSchema::boston()),
            Err(RequestError::OutOfDomain { .. })
        ));
        // Zero is fine where only non-negativity is required
        body["RM"] = json!(6.0);
        body["CRIM"] = json!(0);
        assert!(FeatureRecord::from_json(&body, &ServingSchema::boston()).is_ok());
    }

    #[test]
    fn test_non_object_body() {
        assert_eq!(
            FeatureRecord::from_json(&json!([1, 2, 3]), &ServingSchema::boston()),
            Err(RequestError::NotAnObject)
        );
    }

    #[test]
    fn test_non_finite_pair() {
        let schema = ServingSchema::new(vec![FieldSpec {
            name: "RM".to_string(),
            rule: FieldRule::Positive,
        }]);
        assert!(matches!(
            FeatureRecord::from_pairs([("RM", f64::INFINITY)], &schema),
            Err(RequestError::NonFinite { .. })
        ));
    }
}
