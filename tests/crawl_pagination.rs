//! Integration tests for listing pagination against a mock campus site.

use std::sync::Arc;

use chrono::NaiveDate;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use xjtu_notice::challenge::{ChallengeSolver, MemoryClientIdStore};
use xjtu_notice::crawlers::{CrawlContext, CrawlerRegistry};
use xjtu_notice::models::{ChallengeConfig, CrawlerConfig, Source};

fn jwc_page(rows: &[(&str, &str)], next: Option<&str>) -> String {
    let items: String = rows
        .iter()
        .map(|(title, href)| {
            format!(r#"<li><a href="{href}"><i>[教学运行]</i>{title}</a><span>2025-02-14</span></li>"#)
        })
        .collect();
    let next = match next {
        Some(href) => format!(r#"<span class="p_next"><a href="{href}">下页</a></span>"#),
        None => r#"<span class="p_next">下页</span>"#.to_string(),
    };
    format!(
        r#"<html><body><div id="ny-main">
          <div class="crumbs"></div><div class="title"></div>
          <div class="list">
            <ul>{items}</ul>
            <div><span class="p_pages">
              <span class="p_prev">上页</span>{next}<span class="p_last">尾页</span>
            </span></div>
          </div>
        </div></body></html>"#
    )
}

fn registry(server: &MockServer) -> CrawlerRegistry {
    let solver = ChallengeSolver::new(
        &CrawlerConfig::default(),
        &ChallengeConfig::default(),
        Arc::new(MemoryClientIdStore::new()),
    );
    let origin = Url::parse(&server.uri()).unwrap();
    let ctx = CrawlContext::new(Arc::new(solver))
        .with_origin(Source::Jwc, origin.clone())
        .with_origin(Source::Se, origin);
    CrawlerRegistry::standard(ctx)
}

async fn mount_page(server: &MockServer, at: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_duplicate_across_pages_is_returned_once() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/jxxx/jxtz2.htm",
        jwc_page(
            &[("选课通知", "/info/1033/1.htm"), ("考试安排", "/info/1033/2.htm")],
            Some("jxtz2/2.htm"),
        ),
    )
    .await;
    mount_page(
        &server,
        "/jxxx/jxtz2/2.htm",
        jwc_page(
            &[("考试安排", "/info/1033/2.htm"), ("缓考申请", "/info/1033/3.htm")],
            Some("3.htm"),
        ),
    )
    .await;

    let crawler = registry(&server).create(Source::Jwc, 2).unwrap();
    let notices = crawler.fetch().await.unwrap();

    let titles: Vec<&str> = notices.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, ["选课通知", "考试安排", "缓考申请"]);
    assert_eq!(notices[0].link, format!("{}/info/1033/1.htm", server.uri()));
    assert!(notices[0].has_tag("教学运行"));
    assert!(notices.iter().all(|n| n.source == Source::Jwc));
}

#[tokio::test]
async fn test_stops_when_pages_run_out() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/jxxx/jxtz2.htm",
        jwc_page(&[("选课通知", "/info/1033/1.htm")], Some("jxtz2/2.htm")),
    )
    .await;
    mount_page(
        &server,
        "/jxxx/jxtz2/2.htm",
        jwc_page(&[("缓考申请", "/info/1033/3.htm")], None),
    )
    .await;

    let notices = registry(&server)
        .create(Source::Jwc, 10)
        .unwrap()
        .fetch()
        .await
        .unwrap();
    assert_eq!(notices.len(), 2);
}

#[tokio::test]
async fn test_stops_when_next_loops_back() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/jxxx/jxtz2.htm",
        jwc_page(&[("选课通知", "/info/1033/1.htm")], Some("jxtz2/2.htm")),
    )
    .await;
    mount_page(
        &server,
        "/jxxx/jxtz2/2.htm",
        jwc_page(&[("缓考申请", "/info/1033/3.htm")], Some("../jxtz2.htm")),
    )
    .await;

    let notices = registry(&server)
        .create(Source::Jwc, 10)
        .unwrap()
        .fetch()
        .await
        .unwrap();
    assert_eq!(notices.len(), 2);
}

#[tokio::test]
async fn test_missing_page_is_network_error() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/jxxx/jxtz2.htm",
        jwc_page(&[("选课通知", "/info/1033/1.htm")], Some("jxtz2/2.htm")),
    )
    .await;

    let result = registry(&server).create(Source::Jwc, 2).unwrap().fetch().await;
    assert!(result.unwrap_err().is_network());
}

#[tokio::test]
async fn test_guarded_site_is_crawled_after_handshake() {
    let server = MockServer::start().await;
    let listing = r#"<html><body><main><div>
        <div></div>
        <div><div></div><div>
          <ul><li><a href="../info/1052/3001.htm"><p><span>2025-03-01</span></p><p>毕业设计安排</p></a></li></ul>
        </div></div>
      </div></main></body></html>"#;

    Mock::given(method("GET"))
        .and(path("/xwgg/tzgg.htm"))
        .and(header("cookie", "client_id=se-id"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/xwgg/tzgg.htm"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<script>const challengeId = 'se'; const answer = 3;</script>",
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dynamic_challenge"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "client_id": "se-id" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let notices = registry(&server)
        .create(Source::Se, 1)
        .unwrap()
        .fetch()
        .await
        .unwrap();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].title, "毕业设计安排");
    assert_eq!(
        notices[0].link,
        format!("{}/info/1052/3001.htm", server.uri())
    );
    assert_eq!(notices[0].source, Source::Se);
}

fn gs_page(rows: &[(&str, &str, &str)], pager: &str) -> String {
    let items: String = rows
        .iter()
        .map(|(title, href, date)| {
            format!(r#"<li><a href="{href}">{title}</a><span>{date}</span></li>"#)
        })
        .collect();
    format!(
        r#"<html><body><div id="wrapper">
          <div></div><div></div><div></div>
          <div><div>
            <div></div>
            <div>
              <div></div>
              <div>
                <ul>{items}</ul>
                <div><table><tr><td><table><tr>
                  <td>共3页</td>
                  <td><div>{pager}</div></td>
                </tr></table></td></tr></table></div>
              </div>
            </div>
          </div></div>
        </div></body></html>"#
    )
}

#[tokio::test]
async fn test_graduate_school_columns_are_tagged_and_merged() {
    let server = MockServer::start().await;
    let origin = Url::parse(&server.uri()).unwrap();
    let solver = ChallengeSolver::new(
        &CrawlerConfig::default(),
        &ChallengeConfig::default(),
        Arc::new(MemoryClientIdStore::new()),
    );
    let registry = CrawlerRegistry::standard(
        CrawlContext::new(Arc::new(solver)).with_origin(Source::Gs, origin),
    );

    let shared = ("博士招生简章", "/info/1021/1.htm", "2025-01-08");
    mount_page(&server, "/tzgg.htm", "<html><body>通知公告</body></html>".to_string()).await;

    // First page: only "next" and "last" are shown.
    mount_page(
        &server,
        "/tzgg/zsgz.htm",
        gs_page(
            &[shared],
            r#"<a href="zsgz/2.htm">下页</a><a href="zsgz/3.htm">尾页</a>"#,
        ),
    )
    .await;
    // Later pages lead with "first" and "prev"; the first anchor points back.
    mount_page(
        &server,
        "/tzgg/zsgz/2.htm",
        gs_page(
            &[("硕士复试说明", "/info/1021/2.htm", "2025-02-20")],
            r#"<a href="../zsgz.htm">首页</a><a href="../zsgz.htm">上页</a><a href="3.htm">下页</a><a href="3.htm">尾页</a>"#,
        ),
    )
    .await;
    mount_page(
        &server,
        "/tzgg/zsgz/3.htm",
        gs_page(
            &[("调剂系统开放", "/info/1021/3.htm", "2025-03-05")],
            r#"<a href="../zsgz.htm">首页</a><a href="2.htm">上页</a>"#,
        ),
    )
    .await;

    for column in ["pygz", "gjjl", "xwgz", "yggz"] {
        mount_page(&server, &format!("/tzgg/{column}.htm"), gs_page(&[shared], "")).await;
    }
    mount_page(
        &server,
        "/tzgg/zhgz.htm",
        gs_page(&[shared, ("校历调整", "/info/1021/4.htm", "2025-04-01")], ""),
    )
    .await;

    let notices = registry.create(Source::Gs, 3).unwrap().fetch().await.unwrap();

    let titles: Vec<&str> = notices.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, ["博士招生简章", "硕士复试说明", "调剂系统开放", "校历调整"]);
    for notice in &notices[..3] {
        assert_eq!(notice.tags.iter().collect::<Vec<_>>(), ["招生工作"]);
    }
    assert_eq!(notices[3].tags.iter().collect::<Vec<_>>(), ["综合工作"]);
    assert_eq!(notices[0].date, NaiveDate::from_ymd_opt(2025, 1, 8).unwrap());
    assert_eq!(notices[2].date, NaiveDate::from_ymd_opt(2025, 3, 5).unwrap());
    assert_eq!(notices[1].link, format!("{}/info/1021/2.htm", server.uri()));
    assert!(notices.iter().all(|n| n.source == Source::Gs));
}
