mod common;

use std::sync::Arc;

use common::{container, write_export, OffsetEngine, OffsetLoader, DIM};
use model::{
    annotation::{IS_WORD_START_KEY, PIECE_ID_KEY, SENTENCE_KEY, TOKEN_KEY, WORD_EMBEDDINGS},
    Annotation, BertEmbeddings, LocalCacheFetcher, ModelError, ResourceRequest, Result,
};
use tokenizer::{Sentence, Token, Vocabulary};

#[test]
fn embedding_without_engine_names_set_engine() {
    let model = container();
    let err = model
        .embed_sentences(&[Sentence::new("hello", 0, 0)])
        .unwrap_err();
    assert!(matches!(err, ModelError::EngineNotAttached));
    assert!(err.to_string().contains("set_engine"));

    assert!(matches!(
        model.annotate(&[]),
        Err(ModelError::EngineNotAttached)
    ));
}

#[test]
fn engine_attaches_only_once() -> Result<()> {
    let model = container();
    model.set_engine(Arc::new(OffsetEngine::default()))?;
    assert!(model.has_engine());
    assert!(matches!(
        model.set_engine(Arc::new(OffsetEngine { offset: 1.0 })),
        Err(ModelError::EngineAlreadyAttached)
    ));

    let dir = tempfile::tempdir()?;
    write_export(dir.path(), 0.0);
    assert!(matches!(
        model.attach_engine_from(&OffsetLoader, dir.path()),
        Err(ModelError::EngineAlreadyAttached)
    ));
    assert!(model.engine_artifact().is_none());
    Ok(())
}

#[test]
fn missing_marker_fails_when_model_is_requested() -> Result<()> {
    let vocab = Vocabulary::from_tokens(["[CLS]", "[UNK]", "hello"]);
    let model = BertEmbeddings::new(common::config(), vocab)?;
    model.set_engine(Arc::new(OffsetEngine::default()))?;

    match model.inference_model() {
        Err(ModelError::Tokenizer(tokenizer::Error::MissingSpecialToken { token })) => {
            assert_eq!(token, "[SEP]")
        }
        Err(other) => panic!("expected missing [SEP], got {other}"),
        Ok(_) => panic!("expected missing [SEP], got a model"),
    }
    Ok(())
}

#[test]
fn invalid_config_is_rejected_at_construction() {
    let config = common::config().with_max_sentence_length(1);
    assert!(matches!(
        BertEmbeddings::new(config, common::vocab()),
        Err(ModelError::InvalidConfig(_))
    ));
}

#[test]
fn hello_world_yields_one_vector_per_token() -> Result<()> {
    let model = container();
    model.set_engine(Arc::new(OffsetEngine::default()))?;

    let out = model.embed_sentences(&[Sentence::new("Hello world", 0, 0)])?;
    assert_eq!(out.len(), 1);
    let vectors: Vec<&[f32]> = out[0]
        .word_embeddings()
        .map(|entry| entry.embeddings.as_slice())
        .collect();
    assert_eq!(vectors, vec![&[4.0, 1.0, 0.0, 0.0][..], &[5.0, 2.0, 0.0, 0.0][..]]);
    Ok(())
}

#[test]
fn unknown_word_maps_to_unk() -> Result<()> {
    let model = container();
    model.set_engine(Arc::new(OffsetEngine::default()))?;

    let out = model.embed_sentences(&[Sentence::new("hello xyz", 0, 0)])?;
    let pieces: Vec<(&str, u32)> = out[0]
        .pieces
        .iter()
        .map(|entry| (entry.piece.wordpiece.as_str(), entry.piece.piece_id))
        .collect();
    assert_eq!(pieces, [("hello", 4), ("[UNK]", 2)]);
    Ok(())
}

#[test]
fn annotate_emits_word_embeddings_per_token() -> Result<()> {
    let model = container();
    model.set_engine(Arc::new(OffsetEngine { offset: 0.5 }))?;

    let first = Sentence::new("hello playing", 0, 0);
    let second = Sentence::new("world", 14, 1);
    let token = |text: &str, begin: usize, sentence: usize| {
        Annotation::token(
            &Token {
                text: text.to_owned(),
                begin,
                end: begin + text.len(),
            },
            sentence,
        )
    };
    let input = vec![
        Annotation::document(&first),
        Annotation::document(&second),
        token("hello", 0, 0),
        token("playing", 6, 0),
        token("world", 14, 1),
    ];

    let output = model.annotate(&input)?;
    assert_eq!(output.len(), 3);
    assert!(output
        .iter()
        .all(|annotation| annotation.annotator_type == WORD_EMBEDDINGS));
    assert!(output.iter().all(|annotation| annotation.embeddings.len() == DIM));

    let playing = &output[1];
    assert_eq!(playing.result, "playing");
    assert_eq!((playing.begin, playing.end), (6, 13));
    assert_eq!(playing.metadata[SENTENCE_KEY], "0");
    assert_eq!(playing.metadata[TOKEN_KEY], "playing");
    assert_eq!(playing.metadata[PIECE_ID_KEY], "6");
    assert_eq!(playing.metadata[IS_WORD_START_KEY], "true");
    // first piece "play" sits right after "hello" and the start marker
    assert_eq!(playing.embeddings[..2], [6.5, 2.0]);

    let world = &output[2];
    assert_eq!(world.metadata[SENTENCE_KEY], "1");
    assert_eq!((world.begin, world.end), (14, 19));
    assert_eq!(world.embeddings[..2], [5.5, 1.0]);
    Ok(())
}

#[test]
fn custom_annotator_type_is_written() -> Result<()> {
    let config = common::config().with_annotator_type("bert_vectors");
    let model = BertEmbeddings::new(config, common::vocab())?;
    model.set_engine(Arc::new(OffsetEngine::default()))?;

    let sentence = Sentence::new("world", 0, 0);
    let output = model.annotate(&[
        Annotation::document(&sentence),
        Annotation::token(
            &Token {
                text: "world".into(),
                begin: 0,
                end: 5,
            },
            0,
        ),
    ])?;
    assert_eq!(output[0].annotator_type, "bert_vectors");
    Ok(())
}

#[test]
fn container_is_shared_across_threads() -> Result<()> {
    let model = container();
    model.set_engine(Arc::new(OffsetEngine::default()))?;
    let sentences = vec![
        Sentence::new("hello world", 0, 0),
        Sentence::new("playing", 12, 1),
    ];
    let expected = model.embed_sentences(&sentences)?;

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| model.embed_sentences(&sentences)))
            .collect();
        for handle in handles {
            let out = handle.join().expect("worker panicked").expect("embeddings");
            assert_eq!(out, expected);
        }
    });
    Ok(())
}

#[test]
fn pretrained_resolves_through_local_cache() -> Result<()> {
    let root = tempfile::tempdir()?;
    let fetcher = LocalCacheFetcher::new(root.path());
    let request = ResourceRequest::default();
    write_export(&fetcher.path_for(&request), 0.0);

    let model = BertEmbeddings::pretrained(&fetcher, &request, common::config(), &OffsetLoader)?;
    assert!(model.has_engine());
    assert_eq!(model.vocab().len(), 8);

    let missing = ResourceRequest::new("bert_cased");
    assert!(matches!(
        BertEmbeddings::pretrained(&fetcher, &missing, common::config(), &OffsetLoader),
        Err(ModelError::Resource(_))
    ));
    Ok(())
}
