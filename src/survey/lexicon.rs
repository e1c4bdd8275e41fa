use std::collections::HashMap;
use std::path::Path;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::error::{DialectError, Result};
use crate::OTHER_ANSWER;


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Question {

    pub id: String,
    /// Column prefix of this question in the training data, e.g. `q50`.
    #[serde(default)]
    pub survey_code: Option<String>,
    pub answers: Vec<String>,
    #[serde(default = "default_free_text")]
    pub free_text: bool,
}

fn default_free_text() -> bool {
    true
}

impl Question {
    pub fn new(id: &str, survey_code: Option<&str>, answers: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            survey_code: survey_code.map(str::to_string),
            answers: answers.iter().map(|a| (*a).to_string()).collect(),
            free_text: true,
        }
    }


    #[must_use]
    pub fn is_classifying(&self) -> bool {
        self.survey_code.is_some()
    }


    #[must_use]
    pub fn accepts(&self, answer: &str) -> bool {
        answer == OTHER_ANSWER || self.answers.iter().any(|a| a == answer)
    }
}

lazy_static! {

    static ref DIALECT_QUESTIONS: Vec<Question> = vec![
        Question::new("bug", None, &[
            "basketball bug", "centipede", "doodle bug",
            "I have no idea what this creature is",
            "I know what this creature is, but have no word for it",
            "millipede", "other", "pill bug", "potato bug", "roll-up bug",
            "roly poly", "sow bug", "twiddle bug", "wood louse",
        ]),
        Question::new("beverage", Some("q105"), &[
            "cocola", "coke", "dope", "fizzy drink", "lemonade", "other",
            "pop", "soda", "soft drink", "tonic",
        ]),
        Question::new("second_person_plural", Some("q50"), &[
            "other", "y'all", "yins", "you", "you 'uns", "you all",
            "you guys", "you lot", "yous, youse",
        ]),
        Question::new("cot_caught", Some("q28"), &["different", "other", "same"]),
        Question::new("rain_sun", Some("q80"), &[
            "fox's wedding", "I have no term or expression for this",
            "liquid sun", "monkey's wedding", "other", "pineapple rain",
            "sunshower", "the devil is beating his wife", "the wolf is giving birth",
        ]),
        Question::new("crawfish", Some("q66"), &[
            "craw", "crawdad", "crawfish", "crayfish", "crowfish",
            "I have no word for this critter", "mudbug", "other",
        ]),
        Question::new("halloween", Some("q110"), &[
            "cabbage night", "devil's eve", "devil's night", "gate night",
            "goosy night", "I have no word for this", "mischief night",
            "other", "trick night",
        ]),
        Question::new("sandwich", Some("q64"), &[
            "baguette", "bomber", "grinder", "hero", "hoagie",
            "I have no word for this", "Italian sandwich", "other",
            "poor boy", "sarney", "sub",
        ]),
        Question::new("side_road", Some("q90"), &[
            "access road", "feeder road", "frontage road", "gateway",
            "I've never heard of this concept", "other", "service road",
            "we have them but I have no word for them",
        ]),
        Question::new("shoes", Some("q73"), &[
            "gymshoes", "I have no general word for this", "jumpers", "other",
            "runners", "running shoes", "sand shoes", "shoes", "sneakers",
            "tennis shoes", "trainers",
        ]),
        Question::new("highway", Some("q79"), &[
            "a freeway has limited access (no stop lights, no intersections), whereas a highway can have stop lights and intersections",
            "a freeway is bigger than a highway",
            "a freeway is free (i.e., doesn't charge tolls); a highway isn't",
            "expressway", "freeway", "highway", "other", "parkway",
            "throughway/thru-way", "turnpike",
        ]),
        Question::new("yard_sale", Some("q58"), &[
            "car boot", "car boot sale", "carport sale", "garage sale",
            "jumble (sale)", "other", "patio sale", "rummage sale",
            "sidewalk sale", "stoop sale", "tag sale", "thrift sale", "yard sale",
        ]),
        Question::new("rubbernecking", Some("q107"), &[
            "curiosity delay", "gapers' block", "gapers' delay", "gawk block",
            "I have no word for this", "Lookie Lou", "other", "rubberneck",
            "rubbernecking",
            "rubbernecking is the thing you do, not the traffice jam",
        ]),
        Question::new("frosting", Some("q94"), &[
            "both", "frosting", "icing",
            "icing is thinner than frosting, white, and/or made of powdered sugar and milk or lemon juice",
            "neither", "other",
        ]),
        Question::new("lawyer", Some("q14"), &["either", "other", "law", "boy"]),
        Question::new("kitty_corner", Some("q76"), &[
            "catercorner", "catty-corner", "I can only use \"diagonal\" for this",
            "I have no term for this", "kitacorner", "kitty-corner",
            "kitty cross", "kitty wampus", "other",
        ]),
        Question::new("firefly", Some("q65"), &[
            "firefly", "I have no word for this",
            "I use lightning bug and firefly interchangeably",
            "lightning bug", "other", "peenie wallie",
        ]),
        Question::new("verge", Some("q60"), &[
            "beltway", "berm", "curb strip", "I have no word for this",
            "other", "parking", "terrace", "tree lawn", "verge",
        ]),
        Question::new("brew_thru", Some("q118"), &[
            "beer barn", "beverage barn", "bootlegger", "brew thru",
            "I have never heard of such a thing", "other", "party barn",
            "we have these in my area, but we have no special term for them",
        ]),
        Question::new("water_fountain", Some("q103"), &[
            "bubbler", "drinking fountain", "other", "water bubbler", "water fountain",
        ]),
    ];

    static ref DIALECT_LEXICON: Lexicon = Lexicon::from_questions(DIALECT_QUESTIONS.clone())
        .expect("built-in dialect questions have unique ids and codes");
}


#[derive(Debug, Deserialize)]
struct LexiconFile {
    questions: Vec<Question>,
}

/// Ordered, immutable set of survey questions and their accepted answers.
#[derive(Debug, Clone)]
pub struct Lexicon {
    questions: Vec<Question>,
    by_id: HashMap<String, usize>,
    by_code: HashMap<String, usize>,
}

impl Lexicon {

    pub fn from_questions(questions: Vec<Question>) -> Result<Self> {
        let mut by_id = HashMap::new();
        let mut by_code = HashMap::new();

        for (idx, question) in questions.iter().enumerate() {
            if by_id.insert(question.id.clone(), idx).is_some() {
                return Err(DialectError::Configuration(format!(
                    "duplicate question id '{}'",
                    question.id
                )));
            }
            if let Some(code) = &question.survey_code {
                if by_code.insert(code.to_lowercase(), idx).is_some() {
                    return Err(DialectError::Configuration(format!(
                        "duplicate survey code '{}'",
                        code
                    )));
                }
            }
        }

        Ok(Self {
            questions,
            by_id,
            by_code,
        })
    }

    /// The twenty dialect questions of the elicitation form, in form order.
    #[must_use]
    pub fn default_dialect() -> Self {
        DIALECT_LEXICON.clone()
    }


    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let file: LexiconFile = serde_json::from_str(&raw)?;
        let lexicon = Self::from_questions(file.questions)?;
        info!(
            "Loaded lexicon with {} questions from {}",
            lexicon.len(),
            path.display()
        );
        Ok(lexicon)
    }


    pub fn get(&self, question_id: &str) -> Result<&Question> {
        self.by_id
            .get(question_id)
            .map(|&idx| &self.questions[idx])
            .ok_or_else(|| DialectError::UnknownQuestion(question_id.to_string()))
    }


    #[must_use]
    pub fn contains(&self, question_id: &str) -> bool {
        self.by_id.contains_key(question_id)
    }


    #[must_use]
    pub fn question_by_code(&self, survey_code: &str) -> Option<&Question> {
        self.by_code
            .get(&survey_code.to_lowercase())
            .map(|&idx| &self.questions[idx])
    }


    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }


    pub fn classifying_questions(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter().filter(|q| q.is_classifying())
    }


    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }


    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::default_dialect()
    }
}
