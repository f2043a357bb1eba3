use serde::Deserialize;
use std::fmt::{Display, Formatter};

/// NamedList 출력 형식. facet count 등의 응답 형태에 영향을 줌
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamedListMode {
    /// `["a", 1, "b", 2]`
    Flat,
    /// `{"a": 1, "b": 2}`
    #[default]
    Map,
    /// `[["a", 1], ["b", 2]]`
    ArrArr,
}

impl NamedListMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NamedListMode::Flat => "flat",
            NamedListMode::Map => "map",
            NamedListMode::ArrArr => "arrarr",
        }
    }
}

impl Display for NamedListMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 색인 후 commit 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitWithin {
    /// `commit=true|false` 파라미터로 전달
    Commit(bool),
    /// 지정한 ms 안에 commit. 0이면 아무것도 설정하지 않음
    Millis(u64),
}

impl Default for CommitWithin {
    fn default() -> Self {
        CommitWithin::Commit(false)
    }
}

impl From<bool> for CommitWithin {
    fn from(commit: bool) -> Self {
        CommitWithin::Commit(commit)
    }
}

impl From<u64> for CommitWithin {
    fn from(millis: u64) -> Self {
        CommitWithin::Millis(millis)
    }
}

impl From<u32> for CommitWithin {
    fn from(millis: u32) -> Self {
        CommitWithin::Millis(u64::from(millis))
    }
}

/// 단건 색인 옵션
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexOptions {
    /// 같은 unique key 문서를 덮어쓸지 여부
    pub overwrite: bool,
    pub commit_within: CommitWithin,
    /// 문서 boost
    pub boost: Option<f64>,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            overwrite: true,
            commit_within: CommitWithin::default(),
            boost: None,
        }
    }
}

impl IndexOptions {
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_commit_within(mut self, commit_within: impl Into<CommitWithin>) -> Self {
        self.commit_within = commit_within.into();
        self
    }

    /// `millis` 밀리초 안에 커밋. 정수 리터럴을 그대로 넘길 수 있음
    pub fn with_commit_within_ms(self, millis: u64) -> Self {
        self.with_commit_within(CommitWithin::Millis(millis))
    }

    pub fn with_boost(mut self, boost: f64) -> Self {
        self.boost = Some(boost);
        self
    }
}

/// 일괄 색인 옵션
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub overwrite: bool,
    pub commit_within: CommitWithin,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            overwrite: true,
            commit_within: CommitWithin::default(),
        }
    }
}

impl BatchOptions {
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_commit_within(mut self, commit_within: impl Into<CommitWithin>) -> Self {
        self.commit_within = commit_within.into();
        self
    }

    /// `millis` 밀리초 안에 커밋. 정수 리터럴을 그대로 넘길 수 있음
    pub fn with_commit_within_ms(self, millis: u64) -> Self {
        self.with_commit_within(CommitWithin::Millis(millis))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitOptions {
    pub soft_commit: bool,
    pub wait_searcher: bool,
    pub expunge_deletes: bool,
}

impl Default for CommitOptions {
    fn default() -> Self {
        Self {
            soft_commit: false,
            wait_searcher: true,
            expunge_deletes: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizeOptions {
    pub soft_commit: bool,
    pub wait_searcher: bool,
    pub max_segments: u32,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            soft_commit: false,
            wait_searcher: true,
            max_segments: 1,
        }
    }
}

/// Solr가 기대하는 bool 문자열
pub(crate) fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
