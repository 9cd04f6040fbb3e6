use bencher::{TestCase, TestGroup, route_patterns};
use bytes::Bytes;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use http::Request;
use http_body_util::Empty;
use micro_router::dispatch::MethodDispatcher;
use micro_router::{PathParams, Route, Router, handler_fn};
use std::hint::black_box;

async fn item(params: PathParams) -> String {
    format!("{}/{}", params.get("id").unwrap_or_default(), params.get("item").unwrap_or_default())
}

fn build_router(group: TestGroup) -> Router {
    let mut builder = Router::builder();
    for pattern in route_patterns(group.route_count()) {
        let dispatcher = MethodDispatcher::builder().get(handler_fn(item)).build().expect("GET is a valid method");
        builder = builder.route(Route::parametric(pattern, dispatcher));
    }
    builder.route(Route::prefix("/", handler_fn(|| async { "fallback" }))).build()
}

fn create_test_cases() -> Vec<TestCase> {
    vec![
        TestCase::small("first_route", "/api/resource0/7/items/9"),
        TestCase::small("fallback", "/about"),
        TestCase::normal("last_route", "/api/resource63/7/items/9"),
        TestCase::normal("fallback", "/about"),
        TestCase::large("last_route", "/api/resource511/7/items/9"),
        TestCase::large("fallback", "/about"),
    ]
}

fn benchmark_route_matching(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("route_matching");

    for case in create_test_cases() {
        let router = build_router(case.group());
        let id = BenchmarkId::new(format!("{:?}", case.group()), case.name());
        group.bench_with_input(id, &case, |b, case| {
            b.iter(|| black_box(router.find(black_box(case.path()))));
        });
    }

    group.finish();
}

fn benchmark_dispatch(criterion: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread().build().expect("runtime should build");
    let mut group = criterion.benchmark_group("dispatch");

    for case in create_test_cases() {
        let router = build_router(case.group());
        let id = BenchmarkId::new(format!("{:?}", case.group()), case.name());
        group.bench_with_input(id, &case, |b, case| {
            b.iter(|| {
                let request = Request::builder().uri(case.path()).body(Empty::<Bytes>::new()).expect("valid request");
                black_box(runtime.block_on(router.call(request)))
            });
        });
    }

    group.finish();
}

criterion_group!(router, benchmark_route_matching, benchmark_dispatch);
criterion_main!(router);
