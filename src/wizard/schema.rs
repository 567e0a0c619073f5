//! Typed shapes of the four model responses.
//!
//! Each response is decoded from a recovered JSON object by a validating
//! decoder that names the offending field (`angles[3].titre`) instead of
//! falling back to defaults. The same types serialize into project files with
//! the keys the model uses.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Upper bound of every individual score.
pub const MAX_SCORE: u32 = 10;

/// Angles needed to move past generation.
pub const REQUIRED_SELECTION: usize = 3;

/// Weight of the pain score in the conviction matrix.
pub const WEIGHT_PAIN: u32 = 4;
/// Weight of the uniqueness score in the conviction matrix.
pub const WEIGHT_UNIQUENESS: u32 = 3;
/// Weight of the alignment score in the conviction matrix.
pub const WEIGHT_ALIGNMENT: u32 = 3;

/// A response object that does not match its schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("{schema}: missing required field '{field}'")]
    MissingField { schema: &'static str, field: String },

    #[error("{schema}: field '{field}' should be {expected}")]
    WrongType { schema: &'static str, field: String, expected: &'static str },

    #[error("{schema}: field '{field}' is {value}, expected at most {max}")]
    OutOfRange { schema: &'static str, field: String, value: u64, max: u32 },

    #[error("{schema}: field '{field}' has {found} entries, expected at least {min}")]
    TooFew { schema: &'static str, field: String, found: usize, min: usize },
}

/// A response shape that can be decoded from a JSON object.
pub trait ResponseSchema: Sized {
    /// Schema name used in error messages.
    const NAME: &'static str;

    /// Decode and validate.
    fn decode(object: &Map<String, Value>) -> Result<Self, SchemaError>;
}

/// Field accessor that tracks the path for error messages.
struct Fields<'a> {
    schema: &'static str,
    prefix: String,
    object: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    fn new(schema: &'static str, object: &'a Map<String, Value>) -> Self {
        Self { schema, prefix: String::new(), object }
    }

    fn path(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.prefix, key)
        }
    }

    /// First non-null value among `keys`.
    fn lookup(&self, keys: &[&str]) -> Option<(&'a str, &'a Value)> {
        keys.iter().find_map(|key| {
            self.object
                .get_key_value(*key)
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.as_str(), v))
        })
    }

    fn missing(&self, key: &str) -> SchemaError {
        SchemaError::MissingField { schema: self.schema, field: self.path(key) }
    }

    fn wrong_type(&self, key: &str, expected: &'static str) -> SchemaError {
        SchemaError::WrongType { schema: self.schema, field: self.path(key), expected }
    }

    fn optional_text(&self, key: &str) -> Result<Option<String>, SchemaError> {
        match self.lookup(&[key]) {
            None => Ok(None),
            Some((_, Value::String(s))) => Ok(Some(s.trim().to_string())),
            Some((_, Value::Number(n))) => Ok(Some(n.to_string())),
            Some(_) => Err(self.wrong_type(key, "a string")),
        }
    }

    fn text(&self, key: &str) -> Result<String, SchemaError> {
        self.optional_text(key)?.ok_or_else(|| self.missing(key))
    }

    fn optional_integer(&self, keys: &[&str]) -> Result<Option<u32>, SchemaError> {
        let Some((key, value)) = self.lookup(keys) else {
            return Ok(None);
        };
        let parsed = match value {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f.round() as u64)),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        let parsed = parsed.ok_or_else(|| self.wrong_type(key, "a non-negative integer"))?;
        u32::try_from(parsed)
            .map(Some)
            .map_err(|_| self.wrong_type(key, "a non-negative integer"))
    }

    /// Identifier at `key` in whatever shape it was sent.
    fn echoed_id(&self, key: &str) -> Option<EchoedId> {
        self.lookup(&[key]).map(|(_, value)| EchoedId::from_value(value))
    }

    fn integer(&self, key: &str) -> Result<u32, SchemaError> {
        self.optional_integer(&[key])?.ok_or_else(|| self.missing(key))
    }

    fn score(&self, key: &str) -> Result<u32, SchemaError> {
        let value = self.integer(key)?;
        if value > MAX_SCORE {
            return Err(SchemaError::OutOfRange {
                schema: self.schema,
                field: self.path(key),
                value: u64::from(value),
                max: MAX_SCORE,
            });
        }
        Ok(value)
    }

    fn optional_object(&self, key: &str) -> Result<Option<Fields<'a>>, SchemaError> {
        match self.lookup(&[key]) {
            None => Ok(None),
            Some((_, Value::Object(object))) => {
                Ok(Some(Fields { schema: self.schema, prefix: self.path(key), object }))
            }
            Some(_) => Err(self.wrong_type(key, "an object")),
        }
    }

    /// Every element of the array at `key`, each as an object.
    fn objects(&self, key: &str) -> Result<Vec<Fields<'a>>, SchemaError> {
        let (_, value) = self.lookup(&[key]).ok_or_else(|| self.missing(key))?;
        let Value::Array(items) = value else {
            return Err(self.wrong_type(key, "an array"));
        };

        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let prefix = format!("{}[{}]", self.path(key), i);
                match item {
                    Value::Object(object) => Ok(Fields { schema: self.schema, prefix, object }),
                    _ => Err(SchemaError::WrongType {
                        schema: self.schema,
                        field: prefix,
                        expected: "an object",
                    }),
                }
            })
            .collect()
    }
}

// ============================================================================
// Crash test
// ============================================================================

/// Crash-test verdict, as decided by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "VERT")]
    Vert,
    #[serde(rename = "ROUGE")]
    Rouge,
}

impl Verdict {
    /// `VERT` in any case, surrounding whitespace ignored; anything else is red.
    pub fn from_model(text: &str) -> Self {
        if text.trim().eq_ignore_ascii_case("VERT") {
            Self::Vert
        } else {
            Self::Rouge
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vert => "VERT",
            Self::Rouge => "ROUGE",
        })
    }
}

/// D.U.R. crash-test result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrashTestResult {
    /// Douloureux
    #[serde(rename = "score_D")]
    pub score_d: u32,
    /// Urgent
    #[serde(rename = "score_U")]
    pub score_u: u32,
    /// Reconnu
    #[serde(rename = "score_R")]
    pub score_r: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
    pub verdict: Verdict,
    #[serde(rename = "analyse_critique")]
    pub critique: String,
    #[serde(rename = "conseil_architecte", default, skip_serializing_if = "Option::is_none")]
    pub advice: Option<String>,
}

impl CrashTestResult {
    /// Sum of the three scores.
    pub fn score_sum(&self) -> u32 {
        self.score_d + self.score_u + self.score_r
    }

    /// Total as reported, or the local sum.
    pub fn total(&self) -> u32 {
        self.total.unwrap_or_else(|| self.score_sum())
    }

    /// Verdict the D.U.R. rule gives for these scores.
    ///
    /// ROUGE when the sum is under 20 or any score is under 5.
    pub fn rule_verdict(&self) -> Verdict {
        let lowest = self.score_d.min(self.score_u).min(self.score_r);
        if self.score_sum() < 20 || lowest < 5 {
            Verdict::Rouge
        } else {
            Verdict::Vert
        }
    }

    /// Whether the result is shown as an alert.
    pub fn is_alert(&self) -> bool {
        self.verdict == Verdict::Rouge
    }
}

impl ResponseSchema for CrashTestResult {
    const NAME: &'static str = "crash test";

    fn decode(object: &Map<String, Value>) -> Result<Self, SchemaError> {
        let fields = Fields::new(Self::NAME, object);
        Ok(Self {
            score_d: fields.score("score_D")?,
            score_u: fields.score("score_U")?,
            score_r: fields.score("score_R")?,
            total: fields.optional_integer(&["total"])?,
            verdict: Verdict::from_model(&fields.text("verdict")?),
            critique: fields.text("analyse_critique")?,
            advice: fields.optional_text("conseil_architecte")?,
        })
    }
}

// ============================================================================
// Generation
// ============================================================================

/// One candidate framing of the idea.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Angle {
    /// Identifier echoed by the model. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    #[serde(rename = "titre")]
    pub title: String,
    #[serde(rename = "cible_precise")]
    pub target: String,
    #[serde(rename = "opportunite")]
    pub opportunity: String,
}

/// Angles returned by the generation phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AngleList {
    pub angles: Vec<Angle>,
}

impl ResponseSchema for AngleList {
    const NAME: &'static str = "angles";

    fn decode(object: &Map<String, Value>) -> Result<Self, SchemaError> {
        let fields = Fields::new(Self::NAME, object);
        let angles = fields
            .objects("angles")?
            .iter()
            .map(|angle| {
                Ok(Angle {
                    id: angle.optional_integer(&["id"])?,
                    title: angle.text("titre")?,
                    target: angle.text("cible_precise")?,
                    opportunity: angle.text("opportunite")?,
                })
            })
            .collect::<Result<Vec<_>, SchemaError>>()?;

        if angles.len() < REQUIRED_SELECTION {
            return Err(SchemaError::TooFew {
                schema: Self::NAME,
                field: "angles".to_string(),
                found: angles.len(),
                min: REQUIRED_SELECTION,
            });
        }

        Ok(Self { angles })
    }
}

// ============================================================================
// Prioritization
// ============================================================================

/// Identifier echoed by the model, kept as sent.
///
/// Only ids that resolve to a local position mean anything; anything else
/// (negative, out of range, not a number) is displayed as unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EchoedId {
    Number(i64),
    Text(String),
}

impl EchoedId {
    /// The integer it denotes, if any.
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }

    fn from_value(value: &Value) -> Self {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite() && f.fract() == 0.0).map(|f| f as i64))
                .map_or_else(|| Self::Text(n.to_string()), Self::Number),
            Value::String(s) => Self::Text(s.trim().to_string()),
            other => Self::Text(other.to_string()),
        }
    }
}

impl From<u32> for EchoedId {
    fn from(id: u32) -> Self {
        Self::Number(i64::from(id))
    }
}

impl fmt::Display for EchoedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Conviction-matrix scores for one angle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Local 1-based position the model refers to
    pub id: EchoedId,
    /// Title echoed by the model. Never displayed as authoritative.
    #[serde(rename = "titre", default, skip_serializing_if = "Option::is_none")]
    pub echoed_title: Option<String>,
    #[serde(rename = "score_douleur")]
    pub pain: u32,
    #[serde(rename = "score_unicite")]
    pub uniqueness: u32,
    #[serde(rename = "score_alignement")]
    pub alignment: u32,
    #[serde(rename = "score_total_pondere", default, skip_serializing_if = "Option::is_none")]
    pub weighted_total: Option<u32>,
}

impl Evaluation {
    /// `4 x pain + 3 x uniqueness + 3 x alignment`.
    pub fn computed_total(&self) -> u32 {
        WEIGHT_PAIN * self.pain + WEIGHT_UNIQUENESS * self.uniqueness + WEIGHT_ALIGNMENT * self.alignment
    }

    /// Reported weighted total, or the computed one when it is missing.
    pub fn total(&self) -> u32 {
        self.weighted_total.unwrap_or_else(|| self.computed_total())
    }
}

/// The model's recommended angle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "id_gagnant", default, skip_serializing_if = "Option::is_none")]
    pub winner_id: Option<EchoedId>,
    #[serde(rename = "raison", default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Evaluations of the three selected angles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationSet {
    pub evaluations: Vec<Evaluation>,
    #[serde(rename = "recommandation", default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
}

impl ResponseSchema for EvaluationSet {
    const NAME: &'static str = "evaluations";

    fn decode(object: &Map<String, Value>) -> Result<Self, SchemaError> {
        let fields = Fields::new(Self::NAME, object);
        let evaluations = fields
            .objects("evaluations")?
            .iter()
            .map(|e| {
                Ok(Evaluation {
                    id: e.echoed_id("id").ok_or_else(|| e.missing("id"))?,
                    echoed_title: e.optional_text("titre")?,
                    pain: e.score("score_douleur")?,
                    uniqueness: e.score("score_unicite")?,
                    alignment: e.score("score_alignement")?,
                    weighted_total: e.optional_integer(&["score_total_pondere", "total"])?,
                })
            })
            .collect::<Result<Vec<_>, SchemaError>>()?;

        let recommendation = fields
            .optional_object("recommandation")?
            .map(|reco| {
                Ok::<_, SchemaError>(Recommendation {
                    winner_id: reco.echoed_id("id_gagnant"),
                    reason: reco.optional_text("raison")?,
                })
            })
            .transpose()?;

        Ok(Self { evaluations, recommendation })
    }
}

// ============================================================================
// Sequencing
// ============================================================================

/// One day of the backcasting plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStep {
    /// Day label such as `J+7`
    #[serde(rename = "jour")]
    pub day: String,
    #[serde(rename = "action_principale")]
    pub action: String,
    #[serde(rename = "detail_execution", default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Backcasting plan: the J+7 outcome and the steps leading to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(rename = "resultat_j7")]
    pub target_outcome: String,
    #[serde(rename = "etapes_journalieres")]
    pub steps: Vec<DailyStep>,
}

impl ResponseSchema for Plan {
    const NAME: &'static str = "plan";

    fn decode(object: &Map<String, Value>) -> Result<Self, SchemaError> {
        let fields = Fields::new(Self::NAME, object);
        let steps = fields
            .objects("etapes_journalieres")?
            .iter()
            .map(|step| {
                Ok(DailyStep {
                    day: step.text("jour")?,
                    action: step.text("action_principale")?,
                    detail: step.optional_text("detail_execution")?,
                })
            })
            .collect::<Result<Vec<_>, SchemaError>>()?;

        Ok(Self { target_outcome: fields.text("resultat_j7")?, steps })
    }
}
