use spongebook_backend::bootstrap;
use spongebook_backend::config::{SpongebookConfig, SpongebookPaths};
use spongebook_backend::error::ServiceError;
use spongebook_backend::friends::FriendService;
use spongebook_backend::posts::{CreatePostInput, PostService};
use spongebook_backend::visibility::{Viewer, Visibility};
use tempfile::{tempdir, TempDir};

struct Fixture {
    _dir: TempDir,
    friends: FriendService,
    posts: PostService,
}

fn fixture() -> Fixture {
    let dir = tempdir().expect("tempdir");
    let config = SpongebookConfig::new(
        0,
        SpongebookPaths::from_base_dir(dir.path()).expect("paths"),
    );
    let resources = bootstrap::initialize(&config).expect("bootstrap");
    Fixture {
        _dir: dir,
        friends: FriendService::new(resources.database.clone()),
        posts: PostService::new(resources.database),
    }
}

fn befriend(friends: &FriendService, a: &str, b: &str) {
    let request = friends.follow(a, b).expect("follow");
    friends.accept(request.id).expect("accept");
}

fn every_mutual_edge_has_mutual_reverse(friends: &FriendService) -> bool {
    let edges = friends.list_all().expect("list");
    edges.iter().filter(|edge| edge.mutual).all(|edge| {
        edges.iter().any(|other| {
            other.follower == edge.followee && other.followee == edge.follower && other.mutual
        })
    })
}

#[test]
fn follow_accept_unfollow_lifecycle() {
    let fx = fixture();

    let e1 = fx.friends.follow("A", "B").expect("follow");
    assert!(!e1.mutual);
    assert!(e1.not_read);
    assert!(!fx.friends.is_friend("B", "A").unwrap());

    let accepted = fx.friends.accept(e1.id).expect("accept");
    assert!(accepted.mutual);
    assert!(fx.friends.is_friend("A", "B").unwrap());
    assert!(fx.friends.is_friend("B", "A").unwrap());
    assert!(every_mutual_edge_has_mutual_reverse(&fx.friends));

    let e2 = fx
        .friends
        .friends_of("A")
        .unwrap()
        .into_iter()
        .find(|edge| edge.follower == "B")
        .expect("reverse edge");
    assert!(!e2.not_read);

    fx.friends.unfollow(e2.id).expect("unfollow");
    let remaining = fx.friends.list_all().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, e1.id);
    assert!(!remaining[0].mutual);
    assert!(every_mutual_edge_has_mutual_reverse(&fx.friends));
}

#[test]
fn self_follow_fails_validation() {
    let fx = fixture();
    assert!(matches!(
        fx.friends.follow("A", "A"),
        Err(ServiceError::Validation(_))
    ));
}

#[test]
fn foaf_post_visible_through_shared_friend() {
    let fx = fixture();
    befriend(&fx.friends, "U", "X");
    befriend(&fx.friends, "U", "Y");

    fx.posts
        .create_post(
            "X",
            CreatePostInput {
                title: "for friends of friends".into(),
                visibility: Some(Visibility::Foaf),
                ..Default::default()
            },
        )
        .expect("post");

    let for_y = fx.posts.list_visible(&Viewer::User("Y".into())).unwrap();
    assert_eq!(for_y.len(), 1);
    let for_u = fx.posts.list_visible(&Viewer::User("U".into())).unwrap();
    assert!(for_u.is_empty());
    let for_z = fx.posts.list_visible(&Viewer::User("Z".into())).unwrap();
    assert!(for_z.is_empty());
}

#[test]
fn anonymous_listing_only_contains_listed_public_posts() {
    let fx = fixture();
    let public = fx
        .posts
        .create_post(
            "X",
            CreatePostInput {
                title: "hello world".into(),
                ..Default::default()
            },
        )
        .unwrap();
    fx.posts
        .create_post(
            "X",
            CreatePostInput {
                title: "private".into(),
                visibility: Some(Visibility::Private),
                ..Default::default()
            },
        )
        .unwrap();

    let listing = fx.posts.list_visible(&Viewer::Anonymous).unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].id, public.id);
    let by_author = fx
        .posts
        .list_visible_by_author(&Viewer::Anonymous, "X")
        .unwrap();
    assert_eq!(by_author.len(), 1);
}

#[test]
fn concurrent_accept_and_unfollow_keep_reciprocity() {
    let fx = fixture();

    for _ in 0..25 {
        let request = fx.friends.follow("A", "B").expect("follow");

        let accepting = {
            let friends = fx.friends.clone();
            std::thread::spawn(move || friends.accept(request.id))
        };
        let unfollowing = {
            let friends = fx.friends.clone();
            std::thread::spawn(move || friends.unfollow(request.id))
        };
        let accepted = accepting.join().expect("accept thread");
        let unfollowed = unfollowing.join().expect("unfollow thread");

        assert!(unfollowed.is_ok() || matches!(unfollowed, Err(ServiceError::NotFound(_))));
        assert!(accepted.is_ok() || matches!(accepted, Err(ServiceError::NotFound(_))));
        assert!(every_mutual_edge_has_mutual_reverse(&fx.friends));
        assert!(!fx.friends.is_friend("B", "A").unwrap());

        for edge in fx.friends.list_all().expect("list") {
            fx.friends.unfollow(edge.id).expect("cleanup");
        }
        assert!(fx.friends.list_all().unwrap().is_empty());
    }
}
