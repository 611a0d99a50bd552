use crate::database::Database;
use crate::friends::{FriendService, FriendView};
use crate::posts::{CreatePostInput, PostService, PostView};
use crate::visibility::{Viewer, Visibility};
use anyhow::{anyhow, Context, Result};
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Run the interactive CLI used for managing friend requests and posts
/// directly against the local database.
pub async fn run_cli(database: Database, user: Option<String>) -> Result<()> {
    let mut session = CliSession {
        viewer: Viewer::from_optional(user),
        friend_service: FriendService::new(database.clone()),
        post_service: PostService::new(database),
    };

    println!("Spongebook CLI ready. Type 'help' for a list of commands.");
    session.print_identity();

    let stdin = tokio::io::stdin();
    let mut reader = BufReader::new(stdin);

    loop {
        print!("{}> ", session.prompt());
        io::stdout().flush()?;

        let mut line = String::new();
        let read = reader.read_line(&mut line).await?;
        if read == 0 {
            println!("Exiting");
            break;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let tokens = match shell_words::split(trimmed) {
            Ok(tokens) if !tokens.is_empty() => tokens,
            Ok(_) => continue,
            Err(err) => {
                println!("Unable to parse command: {err}");
                continue;
            }
        };

        match session.handle_command(&tokens) {
            Ok(LoopAction::Continue) => {}
            Ok(LoopAction::Exit) => break,
            Err(err) => {
                println!("Error: {err:#}");
            }
        }
    }

    Ok(())
}

struct CliSession {
    viewer: Viewer,
    friend_service: FriendService,
    post_service: PostService,
}

#[derive(Debug, PartialEq, Eq)]
enum LoopAction {
    Continue,
    Exit,
}

impl CliSession {
    fn handle_command(&mut self, tokens: &[String]) -> Result<LoopAction> {
        let command = tokens[0].as_str();
        match command {
            "help" => self.print_help(),
            "whoami" => self.print_identity(),
            "as" | "login" => {
                let Some(user) = tokens.get(1) else {
                    println!("Usage: as <user_id>");
                    return Ok(LoopAction::Continue);
                };
                self.viewer = Viewer::from_optional(Some(user.clone()));
                self.print_identity();
            }
            "anon" | "logout" => {
                self.viewer = Viewer::Anonymous;
                self.print_identity();
            }
            "follow" => {
                let Some(followee) = tokens.get(1) else {
                    println!("Usage: follow <user_id>");
                    return Ok(LoopAction::Continue);
                };
                let edge = self.friend_service.follow(self.current_user()?, followee)?;
                println!("Friend request {} sent to {}", edge.id, edge.followee);
            }
            "unfollow" => {
                let id = parse_edge_id(tokens, "unfollow <request_id>")?;
                self.friend_service.unfollow(id)?;
                println!("Removed friend request {id}");
            }
            "accept" => {
                let id = parse_edge_id(tokens, "accept <request_id>")?;
                let edge = self.friend_service.accept(id)?;
                println!("{} and {} are now friends", edge.follower, edge.followee);
            }
            "reject" => {
                let id = parse_edge_id(tokens, "reject <request_id>")?;
                let edge = self.friend_service.reject(id)?;
                println!("Rejected request {} from {}", edge.id, edge.follower);
            }
            "edges" => print_edges(&self.friend_service.list_all()?),
            "friends" => {
                let user = self.user_arg(tokens)?;
                print_edges(&self.friend_service.friends_of(&user)?);
            }
            "followers" => {
                let user = self.user_arg(tokens)?;
                print_edges(&self.friend_service.followers_of(&user)?);
            }
            "requests" => {
                let user = self.user_arg(tokens)?;
                print_edges(&self.friend_service.pending_requests_of(&user)?);
            }
            "post" => {
                if tokens.len() < 2 {
                    println!("Usage: post \"title\" [content] [--visibility V] [--unlisted]");
                    return Ok(LoopAction::Continue);
                }
                let input = parse_post_input(&tokens[1..])?;
                let post = self.post_service.create_post(self.current_user()?, input)?;
                println!("Created post {} ({})", post.id, post.visibility);
            }
            "show" => {
                let Some(id) = tokens.get(1) else {
                    println!("Usage: show <post_id>");
                    return Ok(LoopAction::Continue);
                };
                let post = self.post_service.get_post(&self.viewer, id)?;
                print_posts(std::slice::from_ref(&post));
            }
            "delete-post" => {
                let Some(id) = tokens.get(1) else {
                    println!("Usage: delete-post <post_id>");
                    return Ok(LoopAction::Continue);
                };
                self.post_service.delete_post(self.current_user()?, id)?;
                println!("Deleted post {id}");
            }
            "feed" => {
                let posts = match tokens.get(1) {
                    Some(author) => self.post_service.list_visible_by_author(&self.viewer, author)?,
                    None => self.post_service.list_visible(&self.viewer)?,
                };
                print_posts(&posts);
            }
            "quit" | "exit" => return Ok(LoopAction::Exit),
            "clear" => print!("\x1B[2J\x1B[1;1H"),
            other => {
                println!("Unknown command '{other}'. Type 'help' for a list of commands.");
            }
        }
        Ok(LoopAction::Continue)
    }

    fn prompt(&self) -> &str {
        self.viewer.user_id().unwrap_or("anonymous")
    }

    fn current_user(&self) -> Result<&str> {
        self.viewer
            .user_id()
            .ok_or_else(|| anyhow!("no active user; use 'as <user_id>' first"))
    }

    fn user_arg(&self, tokens: &[String]) -> Result<String> {
        match tokens.get(1) {
            Some(user) => Ok(user.clone()),
            None => self.current_user().map(str::to_string),
        }
    }

    fn print_identity(&self) {
        match &self.viewer {
            Viewer::Anonymous => println!("Browsing anonymously"),
            Viewer::User(id) => println!("Acting as {id}"),
        }
    }

    fn print_help(&self) {
        println!("Available commands:");
        println!("  help                 Show this help message");
        println!("  whoami               Show the active user");
        println!("  as <user>            Act as the given user");
        println!("  anon                 Browse anonymously");
        println!("  follow <user>        Follow a user and send a friend request");
        println!("  unfollow <id>        Remove a friend request / follow");
        println!("  accept <id>          Accept a friend request");
        println!("  reject <id>          Reject a friend request");
        println!("  edges                List every friend request");
        println!("  friends [user]       List accepted friends");
        println!("  followers [user]     List one-way followers");
        println!("  requests [user]      List unread friend requests");
        println!("  post TITLE [CONTENT] [--visibility V] [--unlisted]");
        println!("                       Create a post (V: PUBLIC, FRIENDS, FOAF, PRIVATE)");
        println!("  show <post_id>       Display a single post");
        println!("  delete-post <id>     Delete one of your posts");
        println!("  feed [author]        List posts visible to the active user");
        println!("  clear                Clear the screen");
        println!("  exit                 Quit the CLI");
    }
}

fn parse_edge_id(tokens: &[String], usage: &str) -> Result<i64> {
    let raw = tokens
        .get(1)
        .ok_or_else(|| anyhow!("usage: {usage}"))?;
    raw.parse::<i64>()
        .with_context(|| format!("invalid friend request id '{raw}'"))
}

fn parse_post_input(args: &[String]) -> Result<CreatePostInput> {
    let mut input = CreatePostInput::default();
    let mut words = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--unlisted" => input.unlisted = Some(true),
            "--visibility" => {
                let raw = iter
                    .next()
                    .ok_or_else(|| anyhow!("--visibility needs a value"))?;
                let visibility = raw
                    .to_ascii_uppercase()
                    .parse::<Visibility>()
                    .map_err(|err| anyhow!(err))?;
                input.visibility = Some(visibility);
            }
            _ => words.push(arg.clone()),
        }
    }
    let mut words = words.into_iter();
    input.title = words.next().unwrap_or_default();
    let content = words.collect::<Vec<_>>().join(" ");
    if !content.is_empty() {
        input.content = Some(content);
    }
    Ok(input)
}

fn print_edges(edges: &[FriendView]) {
    if edges.is_empty() {
        println!("  (none)");
        return;
    }
    for edge in edges {
        let state = match (edge.mutual, edge.not_read) {
            (true, _) => "friends",
            (false, true) => "pending",
            (false, false) => "following",
        };
        println!(
            "  [{}] {} -> {} ({})",
            edge.id, edge.follower, edge.followee, state
        );
    }
}

fn print_posts(posts: &[PostView]) {
    if posts.is_empty() {
        println!("  (no visible posts)");
        return;
    }
    for post in posts {
        let marker = if post.unlisted { " unlisted" } else { "" };
        println!();
        println!("[{}] {} by {} ({}{})", post.id, post.title, post.author, post.visibility, marker);
        println!("Created: {}", post.created_at);
        if !post.content.is_empty() {
            println!("{}", post.content);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::open_in_memory;

    fn tokens(line: &str) -> Vec<String> {
        shell_words::split(line).unwrap()
    }

    fn session() -> CliSession {
        let db = open_in_memory();
        CliSession {
            viewer: Viewer::Anonymous,
            friend_service: FriendService::new(db.clone()),
            post_service: PostService::new(db),
        }
    }

    #[test]
    fn parses_post_flags() {
        let input = parse_post_input(&tokens("\"Hello there\" some words --visibility foaf --unlisted")).unwrap();
        assert_eq!(input.title, "Hello there");
        assert_eq!(input.content.as_deref(), Some("some words"));
        assert_eq!(input.visibility, Some(Visibility::Foaf));
        assert_eq!(input.unlisted, Some(true));

        assert!(parse_post_input(&tokens("title --visibility everyone")).is_err());
    }

    #[test]
    fn friend_commands_drive_the_graph() {
        let mut session = session();
        assert!(session.handle_command(&tokens("follow bob")).is_err());

        session.handle_command(&tokens("as alice")).unwrap();
        session.handle_command(&tokens("follow bob")).unwrap();
        session.handle_command(&tokens("as bob")).unwrap();
        let pending = session.friend_service.pending_requests_of("bob").unwrap();
        assert_eq!(pending.len(), 1);

        let accept = format!("accept {}", pending[0].id);
        session.handle_command(&tokens(&accept)).unwrap();
        assert!(session.friend_service.is_friend("alice", "bob").unwrap());

        assert_eq!(
            session.handle_command(&tokens("exit")).unwrap(),
            LoopAction::Exit
        );
    }
}
