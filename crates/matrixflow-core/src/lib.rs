//! matrixflow のコア
//!
//! CUDA ベースイメージのビルドマトリクスを扱います。
//!
//! - **model**: ビルドターゲット・マトリクス設定・レジストリ認証情報
//! - **reference**: イメージ参照（タグ）とベースイメージの導出ルール
//! - **matrix**: 軸の直積によるターゲット列挙
//! - **parser / discovery**: matrix.kdl の読み込みと発見

pub mod discovery;
pub mod error;
pub mod matrix;
pub mod model;
pub mod parser;
pub mod reference;

pub use discovery::*;
pub use error::*;
pub use matrix::*;
pub use model::*;
pub use parser::*;
pub use reference::*;
