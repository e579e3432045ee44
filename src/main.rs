fn main() {
    blog_server_api::main();
}
