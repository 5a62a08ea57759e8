use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tokenizer::{Config, Sentence, Vocabulary, WordpieceTokenizer};

fn bench_vocab() -> Arc<Vocabulary> {
    let mut tokens = vec!["[PAD]".to_owned(), "[UNK]".into(), "[CLS]".into(), "[SEP]".into()];
    for word in ["the", "quick", "brown", "fox", "jump", "over", "lazy", "dog", "un"] {
        tokens.push(word.to_owned());
    }
    for suffix in ["s", "ed", "ing", "able", "ly"] {
        tokens.push(format!("##{suffix}"));
    }
    Arc::new(Vocabulary::from_tokens(tokens))
}

fn bench_wordpiece(c: &mut Criterion) {
    let tokenizer = WordpieceTokenizer::new(&Config::default(), bench_vocab()).expect("tokenizer");
    let line = "The quick brown fox jumped over the lazy dogs, unjumpable! ";
    let sentence_counts = &[1usize, 16, 128];

    let mut group = c.benchmark_group("wordpiece");
    for &count in sentence_counts {
        let sentences: Vec<Sentence> = (0..count)
            .map(|index| Sentence::new(line.repeat(4), 0, index))
            .collect();
        let bytes: usize = sentences.iter().map(|s| s.text.len()).sum();
        group.throughput(Throughput::Bytes(bytes as u64));

        group.bench_with_input(BenchmarkId::new("tokenize", count), &sentences, |b, sentences| {
            b.iter(|| {
                for sentence in sentences {
                    black_box(tokenizer.tokenize(black_box(sentence)));
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_wordpiece);
criterion_main!(benches);
