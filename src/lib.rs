// ============================================================
//  lib.rs - Modulele Cyber Threat Analyzer
// ============================================================
//
//  Ordinea dependențelor (frunzele primele):
//    parser, extractor, intel  ->  cache  ->  features  ->  model
//    pipeline leagă totul; display și main țin de consolă.
// ============================================================

pub mod cache;
pub mod config;
pub mod display;
pub mod extractor;
pub mod features;
pub mod intel;
pub mod model;
pub mod parser;
pub mod pipeline;
