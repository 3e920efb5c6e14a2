fn main() {
    pzero::term::main()
}
