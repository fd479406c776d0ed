use rand::{Rng, distr::Alphanumeric};

/// 生成字母数字随机串
pub fn random_token(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
