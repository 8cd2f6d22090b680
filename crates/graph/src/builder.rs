use annotate::{AnnotatedSentence, Annotation};
use std::collections::{HashMap, HashSet};

use crate::model::{NodeId, TextGraph};

/// Content-POS filter. Tokens whose tag falls outside the retained set
/// become neither Word nodes nor structural-edge endpoints.
#[derive(Debug, Clone)]
pub struct PosFilter {
    pub enabled: bool,
    pub tags: HashSet<String>,
}

impl PosFilter {
    /// Noun / verb / adjective / adverb / pronoun / numeral families.
    pub const DEFAULT_TAGS: [&'static str; 8] = ["N", "Np", "V", "A", "Nc", "M", "R", "P"];

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            tags: HashSet::new(),
        }
    }

    pub fn with_tags<I: IntoIterator<Item = String>>(tags: I) -> Self {
        Self {
            enabled: true,
            tags: tags.into_iter().collect(),
        }
    }

    pub fn keeps(&self, pos: &str) -> bool {
        !self.enabled || self.tags.contains(pos)
    }
}

impl Default for PosFilter {
    fn default() -> Self {
        Self {
            enabled: true,
            tags: Self::DEFAULT_TAGS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Stage A: materialize Word / Sentence / Claim nodes and the structural
/// and dependency edges from annotator output.
pub struct GraphBuilder {
    filter: PosFilter,
}

impl GraphBuilder {
    pub fn new(filter: PosFilter) -> Self {
        Self { filter }
    }

    pub fn build(&self, context: &Annotation, claim: &Annotation) -> TextGraph {
        let mut graph = TextGraph::new();

        let claim_node = graph.set_claim(&claim.surface());

        for sentence in &context.sentences {
            let sentence_node = graph.add_sentence(&sentence.surface());
            self.add_utterance_words(&mut graph, sentence, sentence_node);
        }

        for sentence in &claim.sentences {
            self.add_utterance_words(&mut graph, sentence, claim_node);
        }

        graph
    }

    /// Word and dependency pass for one utterance. Dependencies are
    /// emitted only when both endpoints survived POS filtering; a head
    /// index of 0 is ROOT and produces no edge.
    fn add_utterance_words(
        &self,
        graph: &mut TextGraph,
        sentence: &AnnotatedSentence,
        utterance: NodeId,
    ) {
        let mut index_to_node: HashMap<usize, NodeId> = HashMap::new();

        for token in &sentence.tokens {
            if !self.filter.keeps(&token.pos_tag) {
                continue;
            }
            let word = graph.add_word(&token.word_form, &token.pos_tag, &token.lemma);
            graph.connect(word, utterance);
            index_to_node.insert(token.index, word);
        }

        for token in &sentence.tokens {
            if token.head_index == 0 {
                continue;
            }
            let (Some(&dependent), Some(&head)) = (
                index_to_node.get(&token.index),
                index_to_node.get(&token.head_index),
            ) else {
                // Annotator inconsistencies and filtered heads are
                // dropped, never fatal.
                continue;
            };
            graph.connect_dependency(dependent, head, &token.dep_label);
        }
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new(PosFilter::default())
    }
}
