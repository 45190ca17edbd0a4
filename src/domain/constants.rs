//! 사이트 특성 및 도메인 상수들
//!
//! 채용 공고 목록 사이트와 챌린지 API의 고유한 특성들을 정의합니다.
//! 실행 시점의 값은 `infrastructure::config`에서 덮어쓸 수 있습니다.

/// 채용 공고 사이트 특성 상수들
pub mod site {
    /// 페이지당 공고 수 (마지막 페이지 제외)
    pub const JOBS_PER_PAGE: usize = 10;

    /// 페이지 번호는 1-based 인덱싱 사용
    pub const PAGE_NUMBERING_BASE: u32 = 1;

    /// 공고 상세 링크 패턴 (캡처 그룹 1 = 페이지 로컬 식별자)
    pub const JOB_LINK_PATTERN: &str = r"(?i)^/jobs/([0-9]+)$";
}

/// 챌린지 API 관련 상수들
pub mod challenge {
    /// API 기본 URL
    pub const BASE_URL: &str = "https://lu-scraper-challenge.herokuapp.com/";

    /// 요청 타임아웃 (초)
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 20;

    /// 매니페스트 요청 경로
    pub const CHALLENGES_PATH: &str = "challenges";

    /// 공고 목록 페이지 경로
    pub const JOBS_PATH: &str = "jobs";

    /// 배치 제출 경로
    pub const JOBS_BATCH_PATH: &str = "jobs/batch";

    /// 완료 통지 경로
    pub const COMPLETE_PATH: &str = "challenges/complete";
}

/// 재시도 관련 기본값들
pub mod retry {
    /// 첫 시도 이후 최대 재시도 횟수
    pub const DEFAULT_MAX_RETRIES: u32 = 5;

    /// 최소 백오프 지연 (밀리초)
    pub const DEFAULT_MIN_DELAY_MS: u64 = 500;

    /// 최대 백오프 지연 (밀리초)
    pub const DEFAULT_MAX_DELAY_MS: u64 = 10_000;

    /// 백오프 승수
    pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_constants() {
        assert_eq!(site::JOBS_PER_PAGE, 10);
        assert_eq!(site::PAGE_NUMBERING_BASE, 1);
        assert!(challenge::BASE_URL.starts_with("https://"));
        assert!(challenge::BASE_URL.ends_with('/'));
    }

    #[test]
    fn test_retry_ranges() {
        assert!(retry::DEFAULT_MIN_DELAY_MS <= retry::DEFAULT_MAX_DELAY_MS);
        assert!(retry::DEFAULT_BACKOFF_MULTIPLIER >= 1.0);
    }
}
