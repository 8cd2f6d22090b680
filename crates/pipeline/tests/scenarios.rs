//! End-to-end scenarios over the full pipeline, driven by a trivial
//! stub annotation (every token tagged N) and fixed one-hot embeddings.
//! No network access: entity replies are canned strings fed through the
//! same strict-JSON parsing a live extractor reply would see.

use annotate::{AnnotatedSentence, Annotation, Token};
use graph::{EdgeKind, NodeKind};
use index::{EmbeddingCache, EmbeddingSet};
use pipeline::{
    AnalysisRequest, EmbeddingProvider, EntityProvider, Pipeline, PipelineConfig, PipelineError,
};
use std::collections::{BTreeMap, BTreeSet};

fn stub_annotation(sentences: &[&str]) -> Annotation {
    Annotation::new(
        sentences
            .iter()
            .map(|sentence| {
                AnnotatedSentence::new(
                    sentence
                        .split_whitespace()
                        .enumerate()
                        .map(|(i, word)| Token {
                            index: i + 1,
                            word_form: word.to_string(),
                            pos_tag: "N".to_string(),
                            lemma: word.to_lowercase(),
                            head_index: 0,
                            dep_label: String::new(),
                        })
                        .collect(),
                )
            })
            .collect(),
    )
}

/// Point one token at a head within the same sentence.
fn set_dependency(
    annotation: &mut Annotation,
    sentence: usize,
    token: usize,
    head: usize,
    label: &str,
) {
    let t = &mut annotation.sentences[sentence].tokens[token - 1];
    t.head_index = head;
    t.dep_label = label.to_string();
}

/// One-hot of the lowercased text: case variants embed identically,
/// different words are orthogonal.
fn one_hot_embeddings(annotations: &[&Annotation]) -> EmbeddingSet {
    let mut dims: BTreeMap<String, usize> = BTreeMap::new();
    for annotation in annotations {
        for sentence in &annotation.sentences {
            for token in &sentence.tokens {
                let next = dims.len();
                dims.entry(token.word_form.to_lowercase()).or_insert(next);
            }
        }
    }

    let mut set = EmbeddingSet::new();
    for annotation in annotations {
        for sentence in &annotation.sentences {
            for token in &sentence.tokens {
                let mut vector = vec![0.0f32; dims.len()];
                vector[dims[&token.word_form.to_lowercase()]] = 1.0;
                set.insert(&token.word_form, &token.pos_tag, vector);
            }
        }
    }
    set
}

fn pipeline_with(
    config: PipelineConfig,
    entities: EntityProvider,
    embeddings: EmbeddingProvider,
) -> Pipeline {
    Pipeline::with_providers(config, entities, embeddings, EmbeddingCache::default())
}

fn request(context: &[&str], claim: &str) -> (AnalysisRequest, EmbeddingSet) {
    let context_annotation = stub_annotation(context);
    let claim_annotation = stub_annotation(&[claim]);
    let embeddings = one_hot_embeddings(&[&context_annotation, &claim_annotation]);
    (
        AnalysisRequest {
            context_text: context.join(" "),
            context: context_annotation,
            claim: claim_annotation,
        },
        embeddings,
    )
}

#[tokio::test]
async fn test_sawaco_single_sentence_scenario() {
    let (req, embeddings) = request(
        &["SAWACO thông báo tạm ngưng cấp nước"],
        // Case variants of the shared nouns become distinct word nodes
        // whose one-hot embeddings still agree exactly.
        "SAWACO Ngưng Cấp Nước",
    );

    let config = PipelineConfig {
        similarity_threshold: 0.99,
        top_k: 5,
        beam_width: 5,
        max_depth: 3,
        max_paths: 10,
        ..PipelineConfig::default()
    };
    let pipeline = pipeline_with(config, EntityProvider::Disabled, EmbeddingProvider::Fixed(embeddings));

    let outcome = pipeline.run(&req).await.unwrap();

    // Same-lowercase pairs connect with similarity 1.0; nothing else does.
    let semantic: Vec<_> = outcome
        .graph
        .edges()
        .iter()
        .filter(|e| e.kind == EdgeKind::Semantic)
        .collect();
    assert_eq!(semantic.len(), 3);
    for edge in &semantic {
        assert_ne!(edge.source, edge.target, "self matches must be skipped");
        let a = outcome.graph.node(edge.source);
        let b = outcome.graph.node(edge.target);
        assert_eq!(a.text.to_lowercase(), b.text.to_lowercase());
        assert_eq!(edge.similarity, Some(1.0));
    }
    // SAWACO is the same node in claim and context: no self edge.
    let sawaco = outcome.graph.word_id("SAWACO", "N").unwrap();
    assert!(!semantic
        .iter()
        .any(|e| e.source == sawaco && e.target == sawaco));

    let direct = outcome
        .paths
        .iter()
        .find(|p| p.pattern == "C->W->S")
        .expect("a claim-word-sentence path must exist");
    assert!(direct.reached_sentence);
    assert!(direct.score > 5.0);
}

#[tokio::test]
async fn test_frequency_ranks_shared_word_sentences_first() {
    let mut context = stub_annotation(&["nước bẩn", "nước sạch", "bẩn quá"]);
    // "bẩn" depends on "nước" inside the first sentence, which gives the
    // third sentence its only route from the claim.
    set_dependency(&mut context, 0, 2, 1, "amod");
    let claim = stub_annotation(&["nước sạch"]);
    let embeddings = one_hot_embeddings(&[&context, &claim]);

    let req = AnalysisRequest {
        context_text: "nước bẩn nước sạch bẩn quá".to_string(),
        context,
        claim,
    };
    let config = PipelineConfig {
        top_k: 0,
        max_depth: 4,
        beam_width: 20,
        max_paths: 40,
        ..PipelineConfig::default()
    };
    let pipeline = pipeline_with(config, EntityProvider::Disabled, EmbeddingProvider::Fixed(embeddings));

    let outcome = pipeline.run(&req).await.unwrap();

    // Both word-sharing sentences and the dependency-only one are reached
    let reached: BTreeSet<usize> = outcome
        .paths
        .iter()
        .flat_map(|p| p.nodes.iter())
        .filter(|&&id| outcome.graph.node(id).kind == NodeKind::Sentence)
        .map(|&id| outcome.graph.sentence_ordinal(id).unwrap())
        .collect();
    assert!(reached.contains(&0));
    assert!(reached.contains(&1));

    let position = |ordinal: usize| {
        outcome
            .ranked_sentences
            .iter()
            .position(|s| s.sentence_id == ordinal)
    };
    let dep_only = position(2).expect("dependency-only sentence is ranked");
    assert!(position(0).unwrap() < dep_only);
    assert!(position(1).unwrap() < dep_only);
}

#[tokio::test]
async fn test_entity_edges_and_entity_paths() {
    let (req, embeddings) = request(
        &["SAWACO thông báo", "Theo SAWACO tạm ngưng", "Không liên quan"],
        "SAWACO ngưng",
    );

    let config = PipelineConfig {
        top_k: 0,
        ..PipelineConfig::default()
    };
    let pipeline = pipeline_with(
        config,
        EntityProvider::Fixed(r#"[{"name": "SAWACO", "type": "ORG"}]"#.to_string()),
        EmbeddingProvider::Fixed(embeddings),
    );

    let outcome = pipeline.run(&req).await.unwrap();

    assert_eq!(outcome.graph.count_nodes_of_kind(NodeKind::Entity), 1);
    // Exactly the two mentioning sentences gain one edge each
    assert_eq!(outcome.graph.count_edges_of_kind(EdgeKind::Entity), 2);
    assert!(outcome.diagnostics.is_clean());

    let through_entity = outcome
        .paths
        .iter()
        .find(|p| p.visited_entity)
        .expect("some path passes through the entity");
    assert!(through_entity.pattern.contains('E'));
}

#[tokio::test]
async fn test_rerun_produces_bit_identical_exports() {
    let run = || async {
        let (req, embeddings) = request(
            &["SAWACO thông báo tạm ngưng cấp nước", "nước về sau bảo trì"],
            "SAWACO Ngưng Cấp Nước",
        );
        let config = PipelineConfig {
            similarity_threshold: 0.99,
            ..PipelineConfig::default()
        };
        let pipeline = pipeline_with(
            config,
            EntityProvider::Fixed(r#"[{"name": "SAWACO", "type": "ORG"}]"#.to_string()),
            EmbeddingProvider::Fixed(embeddings),
        );
        let outcome = pipeline.run(&req).await.unwrap();

        let graph_json = graph::GraphExport::from_graph(&outcome.graph)
            .to_json()
            .unwrap();
        let paths_doc =
            search::build_export(&outcome.graph, &pipeline.config().search_params(), &outcome.paths);
        let paths_json = serde_json::to_string_pretty(&paths_doc).unwrap();
        (graph_json, paths_json)
    };

    let (graph_a, paths_a) = run().await;
    let (graph_b, paths_b) = run().await;
    assert_eq!(graph_a, graph_b);
    assert_eq!(paths_a, paths_b);
}

#[tokio::test]
async fn test_top_k_zero_changes_nothing_but_semantic() {
    let build = |top_k: usize| async move {
        let (req, embeddings) = request(
            &["SAWACO thông báo tạm ngưng cấp nước", "nước về trong đêm"],
            "SAWACO Ngưng Cấp Nước",
        );
        let config = PipelineConfig {
            similarity_threshold: 0.99,
            top_k,
            // Wide enough that no candidate is ever pruned at this
            // depth, so the non-semantic path set is directly comparable.
            beam_width: 200,
            max_paths: 200,
            max_depth: 3,
            ..PipelineConfig::default()
        };
        let pipeline =
            pipeline_with(config, EntityProvider::Disabled, EmbeddingProvider::Fixed(embeddings));
        pipeline.run(&req).await.unwrap()
    };

    let with_semantic = build(5).await;
    let without_semantic = build(0).await;

    assert!(with_semantic.statistics.semantic_edges > 0);
    assert_eq!(without_semantic.statistics.semantic_edges, 0);

    assert_eq!(
        with_semantic.statistics.total_nodes,
        without_semantic.statistics.total_nodes
    );
    assert_eq!(
        with_semantic.statistics.structural_edges,
        without_semantic.statistics.structural_edges
    );
    assert_eq!(
        with_semantic.statistics.dependency_edges,
        without_semantic.statistics.dependency_edges
    );
    assert_eq!(
        with_semantic.statistics.entity_edges,
        without_semantic.statistics.entity_edges
    );

    // Paths that never traverse a semantic edge are unchanged
    let non_semantic_paths = |outcome: &pipeline::AnalysisOutcome| -> BTreeSet<Vec<usize>> {
        outcome
            .paths
            .iter()
            .filter(|p| p.edges.iter().all(|e| e.2 != EdgeKind::Semantic))
            .map(|p| p.nodes.clone())
            .collect()
    };
    assert_eq!(
        non_semantic_paths(&with_semantic),
        non_semantic_paths(&without_semantic)
    );
}

#[tokio::test]
async fn test_malformed_extractor_response_degrades() {
    let (req, embeddings) = request(&["SAWACO thông báo tạm ngưng"], "SAWACO ngưng");

    let config = PipelineConfig {
        top_k: 0,
        ..PipelineConfig::default()
    };
    let pipeline = pipeline_with(
        config,
        EntityProvider::Fixed("<<not JSON>>".to_string()),
        EmbeddingProvider::Fixed(embeddings),
    );

    let outcome = pipeline.run(&req).await.unwrap();

    assert_eq!(outcome.graph.count_nodes_of_kind(NodeKind::Entity), 0);
    assert!(outcome.graph.count_nodes_of_kind(NodeKind::Word) > 0);
    assert!(outcome.graph.count_nodes_of_kind(NodeKind::Sentence) > 0);
    assert_eq!(outcome.diagnostics.external_unavailable, 1);
    assert!(!outcome.paths.is_empty());
}

#[tokio::test]
async fn test_empty_context_nonempty_claim() {
    let (req, embeddings) = request(&[], "SAWACO ngưng cấp nước");

    let pipeline = pipeline_with(
        PipelineConfig::default(),
        EntityProvider::Fixed(r#"[{"name": "SAWACO", "type": "ORG"}]"#.to_string()),
        EmbeddingProvider::Fixed(embeddings),
    );

    let outcome = pipeline.run(&req).await.unwrap();

    assert_eq!(outcome.graph.count_nodes_of_kind(NodeKind::Claim), 1);
    assert_eq!(outcome.graph.count_nodes_of_kind(NodeKind::Sentence), 0);
    // Claim tokens still become word nodes
    assert_eq!(outcome.graph.count_nodes_of_kind(NodeKind::Word), 4);
    // No sentences to link against, so the extractor is never consulted
    assert_eq!(outcome.graph.count_nodes_of_kind(NodeKind::Entity), 0);
    assert!(outcome.paths.is_empty());
    assert!(outcome.ranked_sentences.is_empty());
}

#[tokio::test]
async fn test_malformed_annotation_is_fatal() {
    let mut claim = stub_annotation(&["SAWACO ngưng"]);
    claim.sentences[0].tokens[0].index = 0;

    let req = AnalysisRequest {
        context_text: String::new(),
        context: stub_annotation(&[]),
        claim,
    };
    let pipeline = pipeline_with(
        PipelineConfig::default(),
        EntityProvider::Disabled,
        EmbeddingProvider::Disabled,
    );

    match pipeline.run(&req).await {
        Err(PipelineError::AnnotatorInput(_)) => {}
        other => panic!("expected AnnotatorInput, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_auto_save_substitutes_timestamp() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir
        .path()
        .join("graph_{timestamp}.json")
        .to_string_lossy()
        .to_string();

    let (req, embeddings) = request(&["SAWACO thông báo"], "SAWACO ngưng");
    let config = PipelineConfig {
        top_k: 0,
        auto_save_graph: true,
        auto_save_path: template,
        ..PipelineConfig::default()
    };
    let pipeline = pipeline_with(config, EntityProvider::Disabled, EmbeddingProvider::Fixed(embeddings));

    let outcome = pipeline.run(&req).await.unwrap();
    assert!(outcome.diagnostics.is_clean());

    let files: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("graph_"));
    assert!(!files[0].contains("{timestamp}"));

    // The saved export round-trips into an identical graph
    let reloaded = graph::load_graph(&dir.path().join(&files[0])).unwrap();
    assert_eq!(reloaded.node_count(), outcome.graph.node_count());
    assert_eq!(reloaded.edge_count(), outcome.graph.edge_count());
}
