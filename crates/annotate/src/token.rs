use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// One annotated token. `index` is 1-based within its sentence;
/// `head_index` points at the governing token, 0 meaning ROOT.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub index: usize,
    #[serde(rename = "wordForm")]
    pub word_form: String,
    #[serde(rename = "posTag")]
    pub pos_tag: String,
    #[serde(default)]
    pub lemma: String,
    #[serde(rename = "head")]
    pub head_index: usize,
    #[serde(rename = "depLabel", default)]
    pub dep_label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedSentence {
    pub tokens: Vec<Token>,
}

impl AnnotatedSentence {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    /// Surface text: segmented word forms joined by single spaces.
    pub fn surface(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.word_form.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// An annotated document: the ordered sentences of one context or claim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Annotation {
    pub sentences: Vec<AnnotatedSentence>,
}

impl Annotation {
    pub fn new(sentences: Vec<AnnotatedSentence>) -> Self {
        Self { sentences }
    }

    /// Surface text of the whole document, sentences joined by spaces.
    pub fn surface(&self) -> String {
        self.sentences
            .iter()
            .map(|s| s.surface())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.iter().all(|s| s.tokens.is_empty())
    }

    /// Reject records the graph builder cannot interpret: a zero or
    /// out-of-range token index, an empty word form, or a head index
    /// pointing past the end of the sentence.
    pub fn validate(&self) -> Result<()> {
        for (sent_idx, sentence) in self.sentences.iter().enumerate() {
            let len = sentence.tokens.len();
            for token in &sentence.tokens {
                if token.index == 0 || token.index > len {
                    bail!(
                        "sentence {}: token index {} out of range 1..={}",
                        sent_idx,
                        token.index,
                        len
                    );
                }
                if token.word_form.is_empty() {
                    bail!("sentence {}: token {} has an empty word form", sent_idx, token.index);
                }
                if token.head_index > len {
                    bail!(
                        "sentence {}: token {} head {} out of range 0..={}",
                        sent_idx,
                        token.index,
                        token.head_index,
                        len
                    );
                }
            }
        }
        Ok(())
    }
}
