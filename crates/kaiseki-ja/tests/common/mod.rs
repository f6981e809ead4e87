// Fixture dictionary shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use kaiseki_ja::{ConnectionCosts, Dictionary, DictionaryBuilder, Mode, Tokenizer, TokenizerConfig};

pub const NOUN: i16 = 1;
pub const PARTICLE: i16 = 2;
pub const VERB: i16 = 3;

const WORDS: &[(&str, i16, i16, &str)] = &[
    ("東京", NOUN, 100, "名詞,固有名詞,地域,一般,*,*,東京,トウキョウ,トーキョー"),
    ("東", NOUN, 500, "名詞,固有名詞,地域,一般,*,*,東,ヒガシ,ヒガシ"),
    ("京", NOUN, 500, "名詞,一般,*,*,*,*,京,キョウ,キョー"),
    ("京都", NOUN, 100, "名詞,固有名詞,地域,一般,*,*,京都,キョウト,キョート"),
    ("都", NOUN, 300, "名詞,接尾,地域,*,*,*,都,ト,ト"),
    ("東京都", NOUN, 250, "名詞,固有名詞,地域,一般,*,*,東京都,トウキョウト,トーキョート"),
    ("関西", NOUN, 100, "名詞,固有名詞,地域,一般,*,*,関西,カンサイ,カンサイ"),
    ("国際", NOUN, 100, "名詞,一般,*,*,*,*,国際,コクサイ,コクサイ"),
    ("空港", NOUN, 100, "名詞,一般,*,*,*,*,空港,クウコウ,クーコー"),
    ("関西国際空港", NOUN, 150, "名詞,固有名詞,組織,*,*,*,関西国際空港,カンサイコクサイクウコウ,カンサイコクサイクーコー"),
    ("すもも", NOUN, 100, "名詞,一般,*,*,*,*,すもも,スモモ,スモモ"),
    ("もも", NOUN, 90, "名詞,一般,*,*,*,*,もも,モモ,モモ"),
    ("も", PARTICLE, 50, "助詞,係助詞,*,*,*,*,も,モ,モ"),
    ("の", PARTICLE, 50, "助詞,連体化,*,*,*,*,の,ノ,ノ"),
    ("に", PARTICLE, 50, "助詞,格助詞,一般,*,*,*,に,ニ,ニ"),
    ("で", PARTICLE, 50, "助詞,格助詞,一般,*,*,*,で,デ,デ"),
    ("うち", NOUN, 100, "名詞,非自立,副詞可能,*,*,*,うち,ウチ,ウチ"),
    ("行く", VERB, 200, "動詞,自立,*,*,五段・カ行促音便,基本形,行く,イク,イク"),
];

const UNKNOWN: &[(&str, i16, &str)] = &[
    ("DEFAULT", 5000, "記号,一般,*,*,*,*,*"),
    ("SPACE", 100, "記号,空白,*,*,*,*,*"),
    ("KANJI", 5000, "名詞,一般,*,*,*,*,*"),
    ("SYMBOL", 4000, "記号,一般,*,*,*,*,*"),
    ("NUMERIC", 4000, "名詞,数,*,*,*,*,*"),
    ("ALPHA", 3000, "名詞,固有名詞,組織,*,*,*,*"),
    ("HIRAGANA", 6000, "名詞,一般,*,*,*,*,*"),
    ("KATAKANA", 3000, "名詞,一般,*,*,*,*,*"),
    ("KANJINUMERIC", 4000, "名詞,数,*,*,*,*,*"),
    ("GREEK", 4000, "名詞,一般,*,*,*,*,*"),
    ("CYRILLIC", 4000, "名詞,一般,*,*,*,*,*"),
];

/// Particles are cheap after nouns, verbs cheap after particles.
fn connection_costs() -> ConnectionCosts {
    let mut costs = ConnectionCosts::new(4, 4);
    costs.set(NOUN as u16, PARTICLE as u16, -50);
    costs.set(PARTICLE as u16, VERB as u16, -50);
    costs.set(NOUN as u16, NOUN as u16, 10);
    costs
}

pub fn builder() -> DictionaryBuilder {
    let mut builder = DictionaryBuilder::new(4);
    builder.connection_costs(connection_costs());
    for &(surface, id, cost, features) in WORDS {
        let features: Vec<&str> = features.split(',').collect();
        builder.add_entry(surface, id, id, cost, &features);
    }
    for &(category, cost, features) in UNKNOWN {
        let features: Vec<&str> = features.split(',').collect();
        builder.add_unknown_entry(category, NOUN, NOUN, cost, &features);
    }
    builder
}

pub fn dictionary() -> Arc<Dictionary> {
    Arc::new(builder().build().unwrap())
}

pub fn tokenizer(mode: Mode) -> Tokenizer {
    Tokenizer::new(dictionary(), TokenizerConfig::default().with_mode(mode))
}
