use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::trace;

use crate::error::{GameError, ParseCardError};

// --- 核心数据结构定义 ---

/// 每个属性都恰好有三个取值，生成和解析都依赖这一点。
pub trait Attribute: Copy + Eq + Sized + 'static {
    const ALL: [Self; 3];

    /// 牌面编码中使用的名字，例如 `solid`、`oval`
    fn name(self) -> &'static str;

    fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == s)
    }

    /// 从三个取值中均匀抽取一个
    fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..3)]
    }
}

/// 填充方式 (Shading)
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shading {
    Solid,   // 实心
    Outline, // 空心
    Striped, // 条纹
}

/// 形状 (Shape)
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Diamond,  // 菱形
    Oval,     // 椭圆
    Squiggle, // 波浪
}

/// 颜色 (Color)
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Green,
    Purple,
    Red,
}

/// 图形个数 (Count)，序列化为数字 1..=3
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Count {
    One,
    Two,
    Three,
}

/// 单张牌 (Card)
/// 牌没有单独的 id，四个属性组成的元组本身就是它的身份。
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub struct Card {
    pub shading: Shading,
    pub shape: Shape,
    pub color: Color,
    pub count: Count,
}

/// 难度 (Difficulty)
/// 简单模式固定填充方式为实心，牌面只剩 27 种组合，更容易找到 Set。
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Hard,
}

impl Attribute for Shading {
    const ALL: [Self; 3] = [Shading::Solid, Shading::Outline, Shading::Striped];

    fn name(self) -> &'static str {
        match self {
            Shading::Solid => "solid",
            Shading::Outline => "outline",
            Shading::Striped => "striped",
        }
    }
}

impl Attribute for Shape {
    const ALL: [Self; 3] = [Shape::Diamond, Shape::Oval, Shape::Squiggle];

    fn name(self) -> &'static str {
        match self {
            Shape::Diamond => "diamond",
            Shape::Oval => "oval",
            Shape::Squiggle => "squiggle",
        }
    }
}

impl Attribute for Color {
    const ALL: [Self; 3] = [Color::Green, Color::Purple, Color::Red];

    fn name(self) -> &'static str {
        match self {
            Color::Green => "green",
            Color::Purple => "purple",
            Color::Red => "red",
        }
    }
}

impl Attribute for Count {
    const ALL: [Self; 3] = [Count::One, Count::Two, Count::Three];

    fn name(self) -> &'static str {
        match self {
            Count::One => "1",
            Count::Two => "2",
            Count::Three => "3",
        }
    }
}

impl Count {
    pub fn value(self) -> u8 {
        match self {
            Count::One => 1,
            Count::Two => 2,
            Count::Three => 3,
        }
    }
}

impl From<Count> for u8 {
    fn from(count: Count) -> u8 {
        count.value()
    }
}

impl TryFrom<u8> for Count {
    type Error = ParseCardError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Count::One),
            2 => Ok(Count::Two),
            3 => Ok(Count::Three),
            _ => Err(ParseCardError::UnknownAttribute(value.to_string())),
        }
    }
}

impl Card {
    pub fn new(shading: Shading, shape: Shape, color: Color, count: Count) -> Card {
        Card { shading, shape, color, count }
    }

    /// 按给定难度随机生成一张牌（不检查是否重复）
    pub fn random<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> Card {
        let shading = match difficulty {
            Difficulty::Easy => Shading::Solid,
            Difficulty::Hard => Shading::sample(rng),
        };
        Card {
            shading,
            shape: Shape::sample(rng),
            color: Color::sample(rng),
            count: Count::sample(rng),
        }
    }
}

impl Difficulty {
    /// 该难度下桌面上的牌数
    pub fn board_size(self) -> usize {
        match self {
            Difficulty::Easy => 9,
            Difficulty::Hard => 12,
        }
    }

    /// 该难度下所有可能出现的牌
    pub fn card_space(self) -> Vec<Card> {
        let shadings: &[Shading] = match self {
            Difficulty::Easy => &[Shading::Solid],
            Difficulty::Hard => &Shading::ALL,
        };
        let mut cards = Vec::with_capacity(shadings.len() * 27);
        for &shading in shadings {
            for shape in Shape::ALL {
                for color in Color::ALL {
                    for count in Count::ALL {
                        cards.push(Card { shading, shape, color, count });
                    }
                }
            }
        }
        cards
    }
}

// --- 实现辅助功能 ---

impl fmt::Display for Card {
    /// 牌面编码：`填充-形状-颜色-个数`，例如 `solid-diamond-green-1`
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.shading.name(),
            self.shape.name(),
            self.color.name(),
            self.count.name()
        )
    }
}

impl FromStr for Card {
    type Err = ParseCardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('-').collect();
        if parts.len() != 4 {
            return Err(ParseCardError::WrongArity(parts.len()));
        }
        let unknown = |p: &str| ParseCardError::UnknownAttribute(p.to_string());
        Ok(Card {
            shading: Shading::parse(parts[0]).ok_or_else(|| unknown(parts[0]))?,
            shape: Shape::parse(parts[1]).ok_or_else(|| unknown(parts[1]))?,
            color: Color::parse(parts[2]).ok_or_else(|| unknown(parts[2]))?,
            count: Count::parse(parts[3]).ok_or_else(|| unknown(parts[3]))?,
        })
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Difficulty::Easy => "easy",
            Difficulty::Hard => "hard",
        })
    }
}

impl FromStr for Difficulty {
    type Err = ParseCardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "hard" => Ok(Difficulty::Hard),
            other => Err(ParseCardError::UnknownDifficulty(other.to_string())),
        }
    }
}

// --- Set 判定 ---

/// 单个属性上三张牌要么全相同，要么两两不同
fn attribute_ok<T: PartialEq>(a: T, b: T, c: T) -> bool {
    let all_same = a == b && b == c;
    let all_diff = a != b && b != c && a != c;
    all_same || all_diff
}

/// 判断三张牌是否组成一个 Set
///
/// 四个属性各自独立判断，只要有一个属性出现“两张相同、一张不同”就不是 Set。
pub fn is_set(a: &Card, b: &Card, c: &Card) -> bool {
    attribute_ok(a.shading, b.shading, c.shading)
        && attribute_ok(a.shape, b.shape, c.shape)
        && attribute_ok(a.color, b.color, c.color)
        && attribute_ok(a.count, b.count, c.count)
}

/// 找出桌面上所有的 Set，返回三张牌的下标 (i < j < k)
pub fn find_sets(cards: &[Card]) -> Vec<[usize; 3]> {
    let mut sets = vec![];
    for i in 0..cards.len() {
        for j in (i + 1)..cards.len() {
            for k in (j + 1)..cards.len() {
                if is_set(&cards[i], &cards[j], &cards[k]) {
                    sets.push([i, j, k]);
                }
            }
        }
    }
    sets
}

// --- 随机发牌 ---

/// 随机抽取失败多少次之后改为在剩余牌中直接挑选
const MAX_RANDOM_ATTEMPTS: usize = 64;

/// 生成一张不在 `existing` 中的牌
///
/// 先按难度随机抽取，撞上已有的牌就重抽；牌面空间（27 或 81）远大于桌面牌数，
/// 所以几乎总是几次之内就能成功。极端情况下退化为在剩余的牌中均匀挑选，
/// 保证循环有界。只有整个牌面空间都被占满时才返回错误。
pub fn generate_unique_card<R: Rng + ?Sized>(
    difficulty: Difficulty,
    existing: &HashSet<Card>,
    rng: &mut R,
) -> Result<Card, GameError> {
    for _ in 0..MAX_RANDOM_ATTEMPTS {
        let card = Card::random(difficulty, rng);
        if !existing.contains(&card) {
            return Ok(card);
        }
        trace!(%card, "card already on the board, retrying");
    }

    let free: Vec<Card> = difficulty
        .card_space()
        .into_iter()
        .filter(|c| !existing.contains(c))
        .collect();
    if free.is_empty() {
        return Err(GameError::CardSpaceExhausted { difficulty, in_use: existing.len() });
    }
    Ok(free[rng.random_range(0..free.len())])
}

// --- 单元测试 ---
