// Small IPADIC-shaped dictionary shared by the unit tests.

use std::sync::Arc;

use crate::builder::DictionaryBuilder;
use crate::connection::ConnectionCosts;
use crate::dictionary::{Dictionary, DictionaryBytes};

pub const NOUN: i16 = 1;
pub const PARTICLE: i16 = 2;
pub const PREFIX: i16 = 3;

pub fn chars(s: &str) -> Vec<char> {
    s.chars().collect()
}

/// Known words as `(surface, connection id, cost, features)`.
pub const WORDS: &[(&str, i16, i16, &str)] = &[
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
    ("うち", NOUN, 100, "名詞,非自立,副詞可能,*,*,*,うち,ウチ,ウチ"),
    ("はし", NOUN, 200, "名詞,一般,*,*,*,*,はし,ハシ,ハシ"),
    ("はし", NOUN, 210, "名詞,一般,*,*,*,*,はし,ハシ,ハシ"),
];

/// Words whose left and right ids differ, as
/// `(surface, left id, right id, cost, features)`.
pub const PREFIXED_WORDS: &[(&str, i16, i16, i16, &str)] = &[
    ("お", NOUN, PREFIX, 1000, "接頭詞,名詞接続,*,*,*,*,お,オ,オ"),
    ("茶", NOUN, NOUN, 1000, "名詞,一般,*,*,*,*,茶,チャ,チャ"),
    ("お茶", NOUN, NOUN, 1500, "名詞,一般,*,*,*,*,お茶,オチャ,オチャ"),
];

/// Only connections touching `PREFIX` cost anything: a prefix is cheap
/// before a noun, a noun expensive before a prefix.
pub fn connection_costs() -> ConnectionCosts {
    let mut costs = ConnectionCosts::new(4, 4);
    costs.set(PREFIX as u16, NOUN as u16, -1000);
    costs.set(NOUN as u16, PREFIX as u16, 1000);
    costs
}

/// Unknown entries as `(category, cost, features)`.
pub const UNKNOWN: &[(&str, i16, &str)] = &[
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

pub fn fixture_builder() -> DictionaryBuilder {
    let mut builder = DictionaryBuilder::new(4);
    builder.connection_costs(connection_costs());
    for &(surface, id, cost, features) in WORDS {
        let features: Vec<&str> = features.split(',').collect();
        builder.add_entry(surface, id, id, cost, &features);
    }
    for &(surface, left_id, right_id, cost, features) in PREFIXED_WORDS {
        let features: Vec<&str> = features.split(',').collect();
        builder.add_entry(surface, left_id, right_id, cost, &features);
    }
    for &(category, cost, features) in UNKNOWN {
        let features: Vec<&str> = features.split(',').collect();
        builder.add_unknown_entry(category, NOUN, NOUN, cost, &features);
    }
    builder
}

pub fn fixture_bytes() -> DictionaryBytes {
    fixture_builder().build_bytes().unwrap()
}

pub fn fixture_dictionary() -> Dictionary {
    fixture_builder().build().unwrap()
}

pub fn fixture_arc() -> Arc<Dictionary> {
    Arc::new(fixture_dictionary())
}
